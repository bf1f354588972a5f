use std::borrow::Cow;

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use tracing::debug;

use crate::{
    analysis::bbox::Rect,
    consts::MARKUP_TAGS,
    error::{BoxviewError, DecodeSnafu},
    layout::element::{Normalized, NormalizedRegion},
};

use super::{resolve_text, PayloadShape};

/// Elements that never have content, so their start tag is also their end.
const VOID_TAGS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Normalizes an HTML fragment whose `td` and `p` elements carry `x`, `y`,
/// `w` and `h` attributes.
///
/// All `td` elements come first, then all `p` elements, each group in
/// document order. Elements with a missing or malformed attribute are
/// dropped and counted in [`Normalized::skipped`].
///
/// The fragment is tokenized without any document model, so a `td` outside
/// a `table` is kept like any other cell.
pub fn normalize_markup(html: &str, width: u32, height: u32) -> Result<Normalized, BoxviewError> {
    let mut reader = Reader::from_str(html);
    reader.trim_text(false);
    reader.check_end_names(false);

    let mut tree = OpenElements::default();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|err| {
            DecodeSnafu {
                shape: PayloadShape::Markup,
                message: format!("at byte {}: {err}", reader.buffer_position()),
            }
            .build()
        })?;

        match event {
            Event::Start(start) => {
                let name = tag_name(start.name().as_ref());
                let geometry = tag_index(&name).map(|index| (index, element_rect(&start)));
                let void = VOID_TAGS.contains(&name.as_str());
                tree.open(name, geometry);
                if void {
                    tree.close_top();
                }
            }
            Event::Empty(start) => {
                let name = tag_name(start.name().as_ref());
                let geometry = tag_index(&name).map(|index| (index, element_rect(&start)));
                tree.open(name, geometry);
                tree.close_top();
            }
            Event::End(end) => tree.close(&tag_name(end.name().as_ref())),
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .unwrap_or_else(|_| Cow::Owned(String::from_utf8_lossy(&text).into_owned()));
                tree.text(text.into_owned());
            }
            Event::CData(data) => tree.text(String::from_utf8_lossy(&data).into_owned()),
            Event::Comment(_) => tree.child(None),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    tree.close_all();

    let mut found = tree.found;
    found.sort_by_key(|found| (found.tag, found.order));

    let mut normalized = Normalized::default();
    for found in found {
        let Some(bbox) = found.bbox else {
            debug!("drop <{}> #{} without usable geometry", MARKUP_TAGS[found.tag], found.order);
            normalized.skipped += 1;
            continue;
        };

        normalized.regions.push(NormalizedRegion {
            text: resolve_text(found.text),
            bbox: bbox.clamp_to(width, height),
            confidence: None,
        });
    }

    Ok(normalized)
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn tag_index(name: &str) -> Option<usize> {
    MARKUP_TAGS.iter().position(|tag| *tag == name)
}

/// `[x, y, x + w, y + h]`, each attribute truncated on its own.
fn element_rect(start: &BytesStart<'_>) -> Option<Rect> {
    let mut geometry = [None; 4];
    for attr in start.html_attributes().flatten() {
        let slot = match tag_name(attr.key.as_ref()).as_str() {
            "x" => 0,
            "y" => 1,
            "w" => 2,
            "h" => 3,
            _ => continue,
        };
        if geometry[slot].is_some() {
            continue;
        }
        let value = attr
            .unescape_value()
            .unwrap_or_else(|_| Cow::Owned(String::from_utf8_lossy(&attr.value).into_owned()));
        geometry[slot] = Some(truncate(&value));
    }

    let [x, y, w, h] = geometry.map(Option::flatten);
    let (x, y, w, h) = (x?, y?, w?, h?);

    Some(Rect::from_corners(
        x,
        y,
        x.saturating_add(w),
        y.saturating_add(h),
    ))
}

fn truncate(raw: &str) -> Option<i32> {
    let value: f64 = raw.trim().parse().ok()?;
    value.is_finite().then(|| value.trunc() as i32)
}

/// A `td` or `p` element, closed and ready to be ordered.
struct Found {
    tag: usize,
    order: usize,
    bbox: Option<Rect>,
    text: Option<String>,
}

struct Frame {
    name: String,
    target: Option<(usize, Option<Rect>)>,
    order: usize,
    children: usize,
    first: Option<String>,
}

impl Frame {
    /// Only an element with exactly one child has a string: the child's
    /// text, or, for a single child element, that element's string.
    fn string(&mut self) -> Option<String> {
        if self.children == 1 { self.first.take() } else { None }
    }
}

/// Stack of elements whose end tag has not been seen yet.
#[derive(Default)]
struct OpenElements {
    stack: Vec<Frame>,
    found: Vec<Found>,
    started: usize,
}

impl OpenElements {
    fn open(&mut self, name: String, target: Option<(usize, Option<Rect>)>) {
        self.close_implied(&name);
        if let Some(parent) = self.stack.last_mut() {
            parent.children += 1;
        }

        self.started += 1;
        self.stack.push(Frame {
            name,
            target,
            order: self.started,
            children: 0,
            first: None,
        });
    }

    /// Closes what a new `name` element ends implicitly: an open cell or row
    /// inside the same table, or an open paragraph.
    fn close_implied(&mut self, name: &str) {
        let (closes, scope): (&[&str], &[&str]) = match name {
            "td" | "th" => (&["td", "th"], &["tr", "table"]),
            "tr" => (&["tr"], &["table"]),
            "p" | "table" | "div" | "ul" | "ol" => (&["p"], &["td", "th", "table"]),
            _ => return,
        };

        let position = self
            .stack
            .iter()
            .rposition(|frame| {
                closes.contains(&frame.name.as_str()) || scope.contains(&frame.name.as_str())
            })
            .filter(|&position| closes.contains(&self.stack[position].name.as_str()));

        if let Some(position) = position {
            while self.stack.len() > position {
                self.close_top();
            }
        }
    }

    /// Ends the nearest open `name` element and everything opened inside it.
    /// A stray end tag is ignored.
    fn close(&mut self, name: &str) {
        if let Some(position) = self.stack.iter().rposition(|frame| frame.name == name) {
            while self.stack.len() > position {
                self.close_top();
            }
        }
    }

    fn close_top(&mut self) {
        let Some(mut frame) = self.stack.pop() else {
            return;
        };
        let text = frame.string();

        if let Some((tag, bbox)) = frame.target {
            self.found.push(Found {
                tag,
                order: frame.order,
                bbox,
                text: text.clone(),
            });
        }

        if let Some(parent) = self.stack.last_mut() {
            if parent.children == 1 {
                parent.first = text;
            }
        }
    }

    fn close_all(&mut self) {
        while !self.stack.is_empty() {
            self.close_top();
        }
    }

    fn text(&mut self, text: String) {
        if !text.is_empty() {
            self.child(Some(text));
        }
    }

    fn child(&mut self, text: Option<String>) {
        if let Some(parent) = self.stack.last_mut() {
            parent.children += 1;
            if parent.children == 1 {
                parent.first = text;
            }
        }
    }
}
