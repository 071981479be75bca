//! Plain value types shared with the host text-editing API
//!
//! Positions, ranges, identifiers, option bags and event payloads. None of
//! these carry behaviour beyond small conveniences; the host owns the text.

use super::ElementHandle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// A buffer position (row, column)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    pub fn zero() -> Self {
        Self { row: 0, column: 0 }
    }
}

impl From<[usize; 2]> for Point {
    fn from([row, column]: [usize; 2]) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// A buffer range. `start` never comes after `end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Point,
    pub end: Point,
}

impl Range {
    /// Build a range from two points in either order
    pub fn new(a: Point, b: Point) -> Self {
        if b < a {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_single_line(&self) -> bool {
        self.start.row == self.end.row
    }

    /// Inclusive of `start`, exclusive of `end`
    pub fn contains_point(&self, point: Point) -> bool {
        point >= self.start && point < self.end
    }
}

impl From<[[usize; 2]; 2]> for Range {
    fn from([start, end]: [[usize; 2]; 2]) -> Self {
        Self::new(start.into(), end.into())
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} - {}]", self.start, self.end)
    }
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Host-assigned editor identifier
    EditorId
);
numeric_id!(
    /// Marker layer identifier. Only unique within one editor.
    LayerId
);
numeric_id!(
    /// Marker identifier. Only unique within one editor.
    MarkerId
);
numeric_id!(SelectionId);

/// How a marker reacts to edits around its range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidationStrategy {
    Never,
    Surround,
    #[default]
    Overlap,
    Inside,
    Touch,
}

/// Updatable marker properties
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkerProperties {
    pub exclusive: bool,
    pub reversed: bool,
    pub invalidate: InvalidationStrategy,
}

/// Marker properties requested by a binding. Unset fields leave the
/// marker's current value alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkerPropertyOverrides {
    pub exclusive: Option<bool>,
    pub reversed: Option<bool>,
    pub invalidate: Option<InvalidationStrategy>,
}

impl MarkerPropertyOverrides {
    pub fn is_empty(&self) -> bool {
        self.exclusive.is_none() && self.reversed.is_none() && self.invalidate.is_none()
    }

    pub fn apply_to(&self, base: MarkerProperties) -> MarkerProperties {
        MarkerProperties {
            exclusive: self.exclusive.unwrap_or(base.exclusive),
            reversed: self.reversed.unwrap_or(base.reversed),
            invalidate: self.invalidate.unwrap_or(base.invalidate),
        }
    }
}

/// Creation options for a marker layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayerOptions {
    pub maintain_history: bool,
    pub persistent: bool,
}

/// Display settings that can be changed on a live editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayConfig {
    pub read_only: bool,
    pub placeholder_text: Option<String>,
    pub line_number_gutter_visible: bool,
    pub auto_width: bool,
    pub auto_height: bool,
    pub soft_wrapped: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            read_only: false,
            placeholder_text: None,
            line_number_gutter_visible: true,
            auto_width: true,
            auto_height: true,
            soft_wrapped: false,
        }
    }
}

/// Everything the host needs to build an editor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorParams {
    /// Initial buffer contents
    pub text: String,
    pub mini: bool,
    pub display: DisplayConfig,
}

/// Cheap, clonable callback wrapper compared by identity
pub struct Callback<A, R = ()>(Rc<dyn Fn(&A) -> R>);

impl<A, R> Callback<A, R> {
    pub fn new(f: impl Fn(&A) -> R + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, arg: &A) -> R {
        (self.0)(arg)
    }
}

impl<A, R> Clone for Callback<A, R> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<A, R> PartialEq for Callback<A, R> {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.0) as *const () == Rc::as_ptr(&other.0) as *const ()
    }
}

impl<A, R> fmt::Debug for Callback<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GutterKind {
    LineNumber,
    #[default]
    Decorated,
}

/// Input to a gutter label function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineLabelRequest {
    pub buffer_row: usize,
    pub screen_row: usize,
    pub soft_wrapped: bool,
    pub max_digits: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GutterMouseEvent {
    pub buffer_row: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GutterOptions {
    pub name: String,
    pub priority: i32,
    pub visible: bool,
    pub kind: GutterKind,
    pub class_name: Option<String>,
    #[serde(skip)]
    pub label_fn: Option<Callback<LineLabelRequest, String>>,
    #[serde(skip)]
    pub on_mouse_down: Option<Callback<GutterMouseEvent>>,
    #[serde(skip)]
    pub on_mouse_move: Option<Callback<GutterMouseEvent>>,
}

impl Default for GutterOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            priority: 100,
            visible: true,
            kind: GutterKind::default(),
            class_name: None,
            label_fn: None,
            on_mouse_down: None,
            on_mouse_move: None,
        }
    }
}

/// Kinds of visual decoration the host can render
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecorationKind {
    #[default]
    Line,
    LineNumber,
    Highlight,
    Overlay,
    Gutter,
    Block,
}

impl DecorationKind {
    /// Kinds that render caller-provided content into an element
    pub fn needs_content_container(self) -> bool {
        match self {
            DecorationKind::Overlay | DecorationKind::Gutter | DecorationKind::Block => true,
            DecorationKind::Line | DecorationKind::LineNumber | DecorationKind::Highlight => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DecorationKind::Line => "line",
            DecorationKind::LineNumber => "line-number",
            DecorationKind::Highlight => "highlight",
            DecorationKind::Overlay => "overlay",
            DecorationKind::Gutter => "gutter",
            DecorationKind::Block => "block",
        }
    }
}

impl fmt::Display for DecorationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecorationPosition {
    Head,
    Tail,
    Before,
    After,
}

/// Parameters for a single host decoration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecorationParams {
    pub kind: DecorationKind,
    pub class_name: Option<String>,
    pub style: BTreeMap<String, String>,
    pub only_head: bool,
    pub only_empty: bool,
    pub only_non_empty: bool,
    pub omit_empty_last_row: bool,
    pub position: Option<DecorationPosition>,
    pub order: Option<i32>,
    pub avoid_overflow: Option<bool>,
    pub gutter_name: Option<String>,
    /// Rendered content for overlay, gutter and block kinds
    pub item: Option<ElementHandle>,
}

/// What a decoration is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecorationTarget {
    Marker(MarkerId),
    Layer(LayerId),
}

/// Raw marker movement reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerChange {
    pub old_head: Point,
    pub new_head: Point,
    pub old_tail: Point,
    pub new_tail: Point,
    pub was_valid: bool,
    pub is_valid: bool,
    pub text_changed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPositionChange {
    pub old_position: Point,
    pub new_position: Point,
    pub text_changed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub id: SelectionId,
    pub range: Range,
    pub reversed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRangeChange {
    pub selection: SelectionId,
    pub old_range: Range,
    pub new_range: Range,
}
