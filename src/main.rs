//! html-to-pdf – command-line HTML → PDF report converter.
//!
//! Usage:
//!   html-to-pdf (--html <HTML> | --file <PATH>) --output <PATH> [--base-url <URL>] [--debug]
//!
//! Exits 0 on success and 1 on any failure, with the error on stderr.

use std::path::PathBuf;
use std::process;

use clap::{ArgGroup, Parser};

use report_pdf::{convert, Diagnostics, RenderRequest};

#[derive(Debug, Parser)]
#[command(name = "html-to-pdf", version, about = "Convert HTML to a paginated PDF report")]
#[command(group(ArgGroup::new("source").required(true).multiple(false).args(["html", "file"])))]
struct Cli {
    /// HTML content to convert
    #[arg(long)]
    html: Option<String>,

    /// Path to an HTML file to convert
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Where to write the PDF; parent directories are created
    #[arg(short, long, value_name = "PATH")]
    output: PathBuf,

    /// Base URL or directory for resolving relative links and images
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Log progress and errors to stderr
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn into_request(self) -> RenderRequest {
        RenderRequest {
            html_content: self.html,
            html_file: self.file,
            output_path: Some(self.output),
            base_url: self.base_url,
            debug: self.debug,
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };

    let diag = Diagnostics::from_debug(cli.debug);
    let request = cli.into_request();

    if let Err(e) = convert::generate_pdf(&request, &diag) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
