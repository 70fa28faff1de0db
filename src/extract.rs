use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

static ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.rich-table tbody tr.rich-table-row").unwrap());
static ID_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td a.accesoTitulo").unwrap());
static TITLE_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td b a").unwrap());
static MARKER_CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td.width15").unwrap());
static SPACER_IMG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img.rich-spacer").unwrap());
static DESC_LABEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("label").unwrap());
static DOWNLOAD_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("td a[title='Descargar Documentos Publicados']").unwrap()
});

/// One announcement row from the board.
#[derive(Debug, Clone, Serialize)]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Raw onclick token of the download affordance, kept verbatim so the
    /// document can be fetched later via postback.
    #[serde(rename = "attachment_reference")]
    pub attachment_ref: Option<String>,
}

/// Parse the announcements table into records, preserving top-to-bottom page
/// order (delivery happens in this order).
pub fn extract(html: &str) -> Vec<Announcement> {
    let doc = Html::parse_document(html);
    doc.select(&ROW).filter_map(parse_row).collect()
}

/// Rows missing id or title are skipped, not errors: the markup is externally
/// controlled and omits fields at will.
fn parse_row(row: ElementRef) -> Option<Announcement> {
    let id = text_of(row.select(&ID_LINK).next()?)?;
    let title = text_of(row.select(&TITLE_LINK).next()?)?;
    let description = description_of(row);
    let attachment_ref = row
        .select(&DOWNLOAD_LINK)
        .next()
        .and_then(|a| a.value().attr("onclick"))
        .map(str::to_string);

    Some(Announcement {
        id,
        title,
        description,
        attachment_ref,
    })
}

/// Two-step structural lookup: a width15 cell holding the spacer image marks
/// the row; its next width80 sibling carries the description label.
fn description_of(row: ElementRef) -> Option<String> {
    for cell in row.select(&MARKER_CELL) {
        if cell.select(&SPACER_IMG).next().is_none() {
            continue;
        }
        let Some(desc_cell) = next_sibling_cell(cell, "width80") else {
            continue;
        };
        if let Some(text) = desc_cell.select(&DESC_LABEL).next().and_then(text_of) {
            return Some(text);
        }
    }
    None
}

fn next_sibling_cell<'a>(cell: ElementRef<'a>, class: &str) -> Option<ElementRef<'a>> {
    cell.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "td" && el.value().classes().any(|c| c == class))
}

fn text_of(el: ElementRef) -> Option<String> {
    let text = el.text().collect::<String>().trim().to_string();
    (!text.is_empty()).then_some(text)
}

// ── Tests ──
