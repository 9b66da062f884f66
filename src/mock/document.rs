use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::browser::{Point, Rect};
use crate::resolver::{
    DomEvent, DomEventKind, Editability, ElementHandle, ElementResolver, PageDocument,
};

/// Behaviour class of a mock element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    #[default]
    Static,
    /// `input`/`textarea` with a selection API
    TextField,
    /// `input type="number"`: has a value but no selection API
    NumberField,
    ContentEditable,
}

/// Element description used to build a [`MockDocument`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MockElement {
    pub tag: String,
    pub id: String,
    pub class_name: String,
    pub xpath: String,
    pub kind: ElementKind,
    pub rect: Option<Rect>,
    pub value: String,
    pub text: String,
    /// Element is absent from the document until this long after it was built
    pub appear_after_ms: u64,
}

impl MockElement {
    fn new(tag: &str, id: &str, kind: ElementKind) -> Self {
        Self {
            tag: tag.to_string(),
            id: id.to_string(),
            kind,
            ..Self::default()
        }
    }

    pub fn button(id: &str) -> Self {
        Self::new("BUTTON", id, ElementKind::Static)
    }

    pub fn text_field(id: &str) -> Self {
        Self::new("INPUT", id, ElementKind::TextField)
    }

    pub fn number_field(id: &str) -> Self {
        Self::new("INPUT", id, ElementKind::NumberField)
    }

    pub fn content_editable(id: &str) -> Self {
        Self::new("DIV", id, ElementKind::ContentEditable)
    }

    pub fn with_class(mut self, class_name: &str) -> Self {
        self.class_name = class_name.to_string();
        self
    }

    pub fn with_xpath(mut self, xpath: &str) -> Self {
        self.xpath = xpath.to_string();
        self
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn appearing_after(mut self, delay: Duration) -> Self {
        self.appear_after_ms = delay.as_millis() as u64;
        self
    }

    fn has_classes(&self, query: &str) -> bool {
        let mut wanted = query.split_whitespace().peekable();
        if wanted.peek().is_none() {
            return false;
        }
        wanted.all(|class| self.class_name.split_whitespace().any(|own| own == class))
    }
}

/// Something that happened to an element
#[derive(Debug, Clone, PartialEq)]
pub enum JournalEntry {
    ScrolledIntoView,
    Focused,
    Event(DomEvent),
    ValueSet(String),
    TextSet(String),
}

#[derive(Default)]
struct DocState {
    elements: Vec<MockElement>,
    carets: HashMap<ElementHandle, usize>,
    focused: Option<ElementHandle>,
    journal: Vec<(ElementHandle, JournalEntry)>,
}

/// In-memory document with a journal of everything done to it.
pub struct MockDocument {
    top: bool,
    built_at: Instant,
    state: Mutex<DocState>,
}

impl MockDocument {
    /// Top-level frame document
    pub fn top(elements: Vec<MockElement>) -> Self {
        Self::build(true, elements)
    }

    /// Nested frame document
    pub fn frame(elements: Vec<MockElement>) -> Self {
        Self::build(false, elements)
    }

    fn build(top: bool, elements: Vec<MockElement>) -> Self {
        Self {
            top,
            built_at: Instant::now(),
            state: Mutex::new(DocState {
                elements,
                ..DocState::default()
            }),
        }
    }

    fn present(&self, element: &MockElement) -> bool {
        self.built_at.elapsed() >= Duration::from_millis(element.appear_after_ms)
    }

    fn matching(&self, predicate: impl Fn(&MockElement) -> bool) -> Vec<ElementHandle> {
        let state = self.state.lock();
        state
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| self.present(el) && predicate(el))
            .map(|(idx, _)| ElementHandle(idx as u64))
            .collect()
    }

    fn with_element<T>(&self, handle: ElementHandle, f: impl FnOnce(&mut MockElement) -> T) -> Option<T> {
        let mut state = self.state.lock();
        state.elements.get_mut(handle.0 as usize).map(f)
    }

    fn note(&self, handle: ElementHandle, entry: JournalEntry) {
        self.state.lock().journal.push((handle, entry));
    }

    /// Handle of the first element with `id`, present or not
    pub fn handle_of(&self, id: &str) -> Option<ElementHandle> {
        let state = self.state.lock();
        state
            .elements
            .iter()
            .position(|el| el.id == id)
            .map(|idx| ElementHandle(idx as u64))
    }

    pub fn value_of(&self, id: &str) -> Option<String> {
        let handle = self.handle_of(id)?;
        self.with_element(handle, |el| el.value.clone())
    }

    pub fn text_of(&self, id: &str) -> Option<String> {
        let handle = self.handle_of(id)?;
        self.with_element(handle, |el| el.text.clone())
    }

    pub fn caret_of(&self, id: &str) -> Option<usize> {
        let handle = self.handle_of(id)?;
        self.state.lock().carets.get(&handle).copied()
    }

    pub fn focused(&self) -> Option<ElementHandle> {
        self.state.lock().focused
    }

    pub fn journal(&self) -> Vec<(ElementHandle, JournalEntry)> {
        self.state.lock().journal.clone()
    }

    pub fn journal_for(&self, handle: ElementHandle) -> Vec<JournalEntry> {
        self.state
            .lock()
            .journal
            .iter()
            .filter(|(h, _)| *h == handle)
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    /// Number of logical clicks delivered to the element with `id`
    pub fn clicks_on(&self, id: &str) -> usize {
        let Some(handle) = self.handle_of(id) else {
            return 0;
        };
        self.journal_for(handle)
            .iter()
            .filter(|entry| matches!(entry, JournalEntry::Event(e) if e.kind == DomEventKind::Click))
            .count()
    }
}

impl ElementResolver for MockDocument {
    fn by_id(&self, id: &str) -> Vec<ElementHandle> {
        if id.is_empty() {
            return Vec::new();
        }
        self.matching(|el| el.id == id)
    }

    fn by_class(&self, class_name: &str) -> Vec<ElementHandle> {
        self.matching(|el| el.has_classes(class_name))
    }

    fn by_xpath(&self, xpath: &str) -> Vec<ElementHandle> {
        if !xpath.starts_with('/') {
            return Vec::new();
        }
        if let Some(id) = xpath
            .strip_prefix("//*[@id=\"")
            .and_then(|rest| rest.strip_suffix("\"]"))
        {
            return self.by_id(id);
        }
        self.matching(|el| el.xpath == xpath)
    }

    fn at_point(&self, point: Point) -> Option<ElementHandle> {
        self.matching(|el| el.rect.is_some_and(|rect| rect.contains(point)))
            .last()
            .copied()
    }

    fn is_top_frame(&self) -> bool {
        self.top
    }
}

impl PageDocument for MockDocument {
    fn bounding_rect(&self, element: ElementHandle) -> Option<Rect> {
        self.with_element(element, |el| el.rect).flatten()
    }

    fn scroll_into_view(&self, element: ElementHandle) {
        self.note(element, JournalEntry::ScrolledIntoView);
    }

    fn dispatch(&self, element: ElementHandle, event: DomEvent) {
        self.note(element, JournalEntry::Event(event));
    }

    fn focus(&self, element: ElementHandle) {
        let mut state = self.state.lock();
        state.focused = Some(element);
        state.journal.push((element, JournalEntry::Focused));
    }

    fn editability(&self, element: ElementHandle) -> Editability {
        match self.with_element(element, |el| el.kind) {
            Some(ElementKind::TextField | ElementKind::NumberField) => Editability::ValueField,
            Some(ElementKind::ContentEditable) => Editability::ContentEditable,
            Some(ElementKind::Static) | None => Editability::NotEditable,
        }
    }

    fn set_text_content(&self, element: ElementHandle, text: &str) {
        self.with_element(element, |el| el.text = text.to_string());
        self.note(element, JournalEntry::TextSet(text.to_string()));
    }

    fn set_value(&self, element: ElementHandle, value: &str) {
        self.with_element(element, |el| el.value = value.to_string());
        self.note(element, JournalEntry::ValueSet(value.to_string()));
    }

    fn set_caret(&self, element: ElementHandle, offset: usize) -> bool {
        if self.with_element(element, |el| el.kind) != Some(ElementKind::TextField) {
            return false;
        }
        self.state.lock().carets.insert(element, offset);
        true
    }
}
