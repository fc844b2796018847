use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::info;
use pdf_embed::{
    CapabilityReport, EmbedOptions, MemoryDocument, OpenParams, PdfObject, StaticHost, Target,
};

/// Inspects inline PDF support for a described browser and renders embed markup.
///
/// The browser is described with the host flags shared by every command; no
/// real browser is contacted.
#[derive(Parser)]
#[command(author, version, about = "Convenience CLI for pdf_embed")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the capability report for the described host as JSON.
    #[command(name = "detect")]
    Detect(HostArgs),

    /// Print the open parameters fragment for the given `key=value` pairs.
    #[command(name = "fragment")]
    Fragment {
        /// Parameter as `key=value`; may be repeated.
        #[arg(short = 'p', long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Page to open at; overrides a `page` parameter.
        #[arg(long)]
        page: Option<u32>,
    },

    /// Render a page embedding the PDF at `url` and print its HTML.
    #[command(name = "render", aliases = ["embed"])]
    Render {
        /// URL of the PDF document.
        url: String,

        /// Create `<div id=CONTAINER>` in the body and embed into it.
        #[arg(long)]
        container: Option<String>,

        /// Embed options as a JSON object.
        #[arg(long, conflicts_with = "options_file")]
        options: Option<String>,

        /// File containing embed options as a JSON object.
        #[arg(long)]
        options_file: Option<PathBuf>,

        /// Write the page to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        host: HostArgs,
    },
}

#[derive(Args)]
struct HostArgs {
    /// User agent string of the host.
    #[arg(long, default_value = "")]
    user_agent: String,

    /// Vendor string of the host.
    #[arg(long, default_value = "")]
    vendor: String,

    /// Register `application/pdf` in the plugin MIME registry.
    #[arg(long)]
    pdf_plugin: bool,

    /// Treat the host as lacking `Promise`.
    #[arg(long)]
    no_promise: bool,

    /// Installed ActiveX control; enables the ActiveX mechanism.
    #[arg(long = "active-x")]
    active_x: Vec<String>,
}

impl HostArgs {
    fn to_host(&self) -> StaticHost {
        let mut host = StaticHost::new(self.user_agent.as_str())
            .with_vendor(self.vendor.as_str())
            .with_promise(!self.no_promise);
        if self.pdf_plugin {
            host = host.with_pdf_plugin();
        }
        if !self.active_x.is_empty() {
            host = host.with_active_x(self.active_x.iter().map(String::as_str));
        }
        host
    }
}

fn parse_param(input: &str) -> Result<(String, String), String> {
    input
        .split_once('=')
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .ok_or_else(|| format!("expected key=value, got '{input}'"))
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Detect(host) => detect(&host),
        Commands::Fragment { params, page } => fragment(params, page),
        Commands::Render {
            url,
            container,
            options,
            options_file,
            output,
            host,
        } => render(&url, container, options, options_file, output, &host),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn detect(host: &HostArgs) -> Result<(), Box<dyn Error>> {
    let report = CapabilityReport::detect(&host.to_host());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn fragment(params: Vec<(String, String)>, page: Option<u32>) -> Result<(), Box<dyn Error>> {
    let mut options = EmbedOptions::new().with_pdf_open_params(params.into_iter().collect::<OpenParams>());
    if let Some(page) = page {
        options = options.with_page(page);
    }
    println!("{}", options.effective_open_params().to_fragment());
    Ok(())
}

fn render(
    url: &str,
    container: Option<String>,
    options: Option<String>,
    options_file: Option<PathBuf>,
    output: Option<PathBuf>,
    host: &HostArgs,
) -> Result<(), Box<dyn Error>> {
    let options = match (options, options_file) {
        (Some(json), _) => EmbedOptions::from_json_str(&json)?,
        (None, Some(path)) => EmbedOptions::from_json_str(&fs::read_to_string(path)?)?,
        (None, None) => EmbedOptions::default(),
    };

    let mut document = MemoryDocument::new();
    let target = match &container {
        Some(id) => {
            let body = document.body_node();
            let node = document.create_element("div");
            document.set_attribute(&node, "id", id);
            document.append_child(&body, &node);
            Target::Node(node)
        }
        None => Target::Body,
    };

    let pdf = PdfObject::detect(&host.to_host());
    let embedded = pdf.embed(&mut document, url, target, &options);
    if let Ok(element) = &embedded {
        info!(
            "Embedded {} as <{}>",
            url,
            document.tag(element).unwrap_or_default()
        );
    }

    let html = document.to_html();
    match output {
        Some(path) => {
            fs::write(&path, &html)?;
            println!("Generated {} ({} bytes)", path.display(), html.len());
        }
        None => println!("{html}"),
    }

    // Fallback markup is still written out before the failure is surfaced.
    embedded.map(|_| ()).map_err(Into::into)
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
