use serde::{Deserialize, Serialize};

use crate::capture::LocatorDescriptor;
use crate::resolver::document::{ElementHandle, ElementResolver};

/// Locator tier that produced an element, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPath {
    Id,
    ClassName,
    XPath,
    Coordinates,
}

impl ResolutionPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPath::Id => "id",
            ResolutionPath::ClassName => "class_name",
            ResolutionPath::XPath => "xpath",
            ResolutionPath::Coordinates => "coordinates",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub element: ElementHandle,
    pub path: ResolutionPath,
}

fn unique(matches: Vec<ElementHandle>) -> Option<ElementHandle> {
    match matches.as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

/// One resolution attempt against the current document.
///
/// Tiers are tried in order id, class name, xpath, and, when
/// `allow_coordinates` is set, the element under the recorded point. A tier
/// only wins with exactly one match. Coordinates are never used inside
/// nested frames since they are frame-relative.
pub fn resolve_once<R>(
    resolver: &R,
    locator: &LocatorDescriptor,
    allow_coordinates: bool,
) -> Option<Resolution>
where
    R: ElementResolver + ?Sized,
{
    let found = |element, path| Resolution { element, path };

    if let Some(element) = locator.id.as_deref().and_then(|id| unique(resolver.by_id(id))) {
        return Some(found(element, ResolutionPath::Id));
    }
    if let Some(element) = locator
        .class_name
        .as_deref()
        .and_then(|class| unique(resolver.by_class(class)))
    {
        return Some(found(element, ResolutionPath::ClassName));
    }
    if let Some(element) = locator
        .xpath
        .as_deref()
        .and_then(|xpath| unique(resolver.by_xpath(xpath)))
    {
        return Some(found(element, ResolutionPath::XPath));
    }
    if allow_coordinates && resolver.is_top_frame() {
        if let Some(element) = locator.point.and_then(|point| resolver.at_point(point)) {
            return Some(found(element, ResolutionPath::Coordinates));
        }
    }
    None
}
