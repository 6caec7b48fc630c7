use std::path::Path;
use std::rc::Rc;

use crate::renderer::{
    DocumentKind, Listing, ListingEntry, MediaKind, MessageKind, PreviewContent, Table,
    TextPreview,
};
use crate::ui::StyleTokens;
use gtk4::prelude::*;
use gtk4::{Align, Box as GtkBox, Button, Grid, Label, Orientation, ScrolledWindow};

pub(super) type OpenExternally = Rc<dyn Fn()>;

/// Builds the widget tree for one piece of preview content.
pub(super) fn build_content_widget(
    content: &PreviewContent,
    tokens: StyleTokens,
    open_externally: OpenExternally,
) -> gtk4::Widget {
    match content {
        PreviewContent::Loading { label } => loading_view(label, tokens),
        PreviewContent::Message { kind, text } => message_view(*kind, text),
        PreviewContent::Text(text) => scrolled(&text_view(text, "preview-text")),
        PreviewContent::Hex(text) => scrolled(&text_view(text, "preview-hex")),
        PreviewContent::Listing(listing) => scrolled(&listing_view(listing, tokens)),
        PreviewContent::Table(table) => scrolled(&table_view(table, tokens)),
        PreviewContent::Image { path, .. } => picture_view(path),
        PreviewContent::Media { path, kind } => media_view(path, *kind),
        PreviewContent::Document {
            source: Some(source),
            ..
        } => scrolled(&text_view(source, "preview-text")),
        PreviewContent::Document { path, kind, .. } => {
            if is_svg(path) {
                picture_view(path)
            } else {
                provider_card(document_hint(*kind), tokens, open_externally)
            }
        }
        PreviewContent::Details { title, fields } => scrolled(&details_view(title, fields, tokens)),
        PreviewContent::ShellProvider { provider, .. } => host_region(provider_card(
            &format!("This file is previewed by {provider}."),
            tokens,
            open_externally,
        )),
    }
}

fn scrolled(child: &impl IsA<gtk4::Widget>) -> gtk4::Widget {
    let scroller = ScrolledWindow::new();
    scroller.set_hexpand(true);
    scroller.set_vexpand(true);
    scroller.set_child(Some(child));
    scroller.upcast()
}

fn plain_label(text: &str, css_class: &str) -> Label {
    let label = Label::new(Some(text));
    label.set_xalign(0.0);
    label.set_selectable(true);
    label.add_css_class(css_class);
    label
}

fn loading_view(label: &str, tokens: StyleTokens) -> gtk4::Widget {
    let column = GtkBox::new(Orientation::Vertical, tokens.spacing_8);
    column.set_halign(Align::Center);
    column.set_valign(Align::Center);
    let spinner = gtk4::Spinner::new();
    spinner.start();
    column.append(&spinner);
    column.append(&Label::new(Some(label)));
    column.upcast()
}

fn message_view(kind: MessageKind, text: &str) -> gtk4::Widget {
    let label = Label::new(Some(text));
    label.set_wrap(true);
    label.set_selectable(true);
    label.set_halign(Align::Center);
    label.set_valign(Align::Center);
    label.set_vexpand(true);
    label.add_css_class("preview-message");
    if kind == MessageKind::Error {
        label.add_css_class("error");
    }
    label.upcast()
}

fn text_view(text: &TextPreview, css_class: &str) -> gtk4::TextView {
    let view = gtk4::TextView::new();
    view.set_editable(false);
    view.set_cursor_visible(false);
    view.set_monospace(true);
    view.set_wrap_mode(gtk4::WrapMode::None);
    view.add_css_class(css_class);
    view.buffer().set_text(&text.body);
    view
}

fn listing_entry_detail(entry: &ListingEntry) -> String {
    let size = entry
        .size
        .filter(|_| !entry.is_dir)
        .map(|bytes| humansize::format_size(bytes, humansize::BINARY));
    [size, entry.modified.clone()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("  ·  ")
}

fn listing_view(listing: &Listing, tokens: StyleTokens) -> GtkBox {
    let column = GtkBox::new(Orientation::Vertical, tokens.spacing_4);
    for line in &listing.summary {
        column.append(&plain_label(line, "preview-summary"));
    }

    for entry in &listing.entries {
        let row = GtkBox::new(Orientation::Horizontal, tokens.spacing_8);
        let icon = if entry.is_dir {
            "folder-symbolic"
        } else {
            "text-x-generic-symbolic"
        };
        row.append(&gtk4::Image::from_icon_name(icon));
        let name = plain_label(&entry.name, "preview-entry-name");
        name.set_hexpand(true);
        name.set_ellipsize(gtk4::pango::EllipsizeMode::Middle);
        row.append(&name);
        row.append(&plain_label(&listing_entry_detail(entry), "preview-summary"));
        column.append(&row);
    }

    if listing.truncated {
        column.append(&plain_label("...", "preview-summary"));
    }
    column
}

fn table_view(table: &Table, tokens: StyleTokens) -> Grid {
    let grid = Grid::new();
    grid.set_column_spacing(tokens.spacing_12 as u32);
    grid.set_row_spacing(tokens.spacing_4 as u32);
    for (column, header) in table.headers.iter().enumerate() {
        grid.attach(&plain_label(header, "preview-field-name"), column as i32, 0, 1, 1);
    }
    for (row_index, row) in table.rows.iter().enumerate() {
        for (column, cell) in row.iter().enumerate() {
            grid.attach(
                &plain_label(cell, "preview-cell"),
                column as i32,
                row_index as i32 + 1,
                1,
                1,
            );
        }
    }
    grid
}

fn details_view(title: &str, fields: &[(String, String)], tokens: StyleTokens) -> GtkBox {
    let column = GtkBox::new(Orientation::Vertical, tokens.spacing_12);
    column.append(&plain_label(title, "preview-title"));
    let grid = Grid::new();
    grid.set_column_spacing(tokens.spacing_12 as u32);
    grid.set_row_spacing(tokens.spacing_8 as u32);
    for (row, (name, value)) in fields.iter().enumerate() {
        grid.attach(&plain_label(name, "preview-field-name"), 0, row as i32, 1, 1);
        let value = plain_label(value, "preview-field-value");
        value.set_wrap(true);
        value.set_wrap_mode(gtk4::pango::WrapMode::WordChar);
        grid.attach(&value, 1, row as i32, 1, 1);
    }
    column.append(&grid);
    column
}

fn picture_view(path: &Path) -> gtk4::Widget {
    let picture = gtk4::Picture::for_filename(path);
    picture.set_hexpand(true);
    picture.set_vexpand(true);
    picture.set_can_shrink(true);
    picture.set_keep_aspect_ratio(true);
    picture.upcast()
}

fn media_view(path: &Path, kind: MediaKind) -> gtk4::Widget {
    let video = gtk4::Video::new();
    video.set_autoplay(kind == MediaKind::Audio);
    video.set_hexpand(true);
    video.set_vexpand(true);
    video.set_file(Some(&gtk4::gio::File::for_path(path)));
    video.upcast()
}

fn is_svg(path: &Path) -> bool {
    crate::renderer::extension_of(path).as_deref() == Some("svg")
}

fn document_hint(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Pdf => "PDF documents open in your default viewer.",
        DocumentKind::Html => "Web pages open in your default browser.",
        DocumentKind::Markdown => "Markdown opens in your default editor.",
    }
}

/// Area a system preview handler draws over; the card shows until it does.
fn host_region(card: gtk4::Widget) -> gtk4::Widget {
    let region = GtkBox::new(Orientation::Vertical, 0);
    region.add_css_class("preview-host");
    region.set_hexpand(true);
    region.set_vexpand(true);
    card.set_vexpand(true);
    region.append(&card);
    region.upcast()
}

fn provider_card(text: &str, tokens: StyleTokens, open_externally: OpenExternally) -> gtk4::Widget {
    let card = GtkBox::new(Orientation::Vertical, tokens.spacing_12);
    card.add_css_class("preview-provider-card");
    card.set_halign(Align::Center);
    card.set_valign(Align::Center);
    let label = Label::new(Some(text));
    label.set_wrap(true);
    card.append(&label);
    let open = Button::with_label("Open with default app");
    open.set_halign(Align::Center);
    open.connect_clicked(move |_| open_externally());
    card.append(&open);
    card.upcast()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_entry_detail_skips_directory_sizes() {
        let file = ListingEntry {
            name: "a.bin".to_string(),
            is_dir: false,
            size: Some(2048),
            modified: Some("2024-01-02 03:04".to_string()),
        };
        assert_eq!(listing_entry_detail(&file), "2 KiB  ·  2024-01-02 03:04");

        let dir = ListingEntry {
            name: "src".to_string(),
            is_dir: true,
            size: Some(4096),
            modified: None,
        };
        assert_eq!(listing_entry_detail(&dir), "");
    }

    #[test]
    fn only_svg_documents_render_inline() {
        assert!(is_svg(Path::new("logo.SVG")));
        assert!(!is_svg(Path::new("index.html")));
        assert!(document_hint(DocumentKind::Pdf).contains("PDF"));
    }
}
