use lopdf::Document;
use pdfsift::pdf::fixture::build_pdf;
use std::path::Path;

/// Write a PDF with one page per string.
pub fn write_pdf(path: &Path, texts: &[&str]) {
    build_pdf(texts).unwrap().save(path).unwrap();
}

/// Text of every page of a PDF on disk, trimmed.
pub fn read_pages(path: &Path) -> Vec<String> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .keys()
        .map(|&page| doc.extract_text(&[page]).unwrap().trim().to_string())
        .collect()
}

/// Write a job list CSV with a header row.
pub fn write_jobs(path: &Path, rows: &[Vec<&str>]) {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path).unwrap();
    writer
        .write_record(["NAMING CONVENTION", "MPN", "PAGES"])
        .unwrap();
    for row in rows {
        writer.write_record(row).unwrap();
    }
    writer.flush().unwrap();
}
