use std::error::Error;

use pdf_embed::{EmbedOptions, MemoryDocument, OpenParams, PdfObject, StaticHost, Target};

const FIREFOX: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.12; rv:57.0) Gecko/20100101 Firefox/57.0";

fn main() -> Result<(), Box<dyn Error>> {
    let pdf = PdfObject::detect(&StaticHost::new(FIREFOX).with_promise(true));

    let mut document = MemoryDocument::new();
    let body = document.body_node();
    let container = document.create_element("div");
    document.set_attribute(&container, "id", "report");
    document.append_child(&body, &container);

    let options = EmbedOptions::new()
        .with_id("report-viewer")
        .with_height("40rem")
        .with_pdf_open_params(OpenParams::new().with("view", "FitH").with("pagemode", "none"))
        .with_page(2)
        .with_pdfjs_url("/pdfjs/web/viewer.html");
    pdf.embed(&mut document, "report.pdf", Target::Selector("#report"), &options)?;

    let html = document.to_html();
    std::fs::write("embed_page.html", &html)?;
    println!("Generated embed_page.html ({} bytes)", html.len());
    Ok(())
}
