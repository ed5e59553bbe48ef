//! The DOM element a ripple overlays

use web_sys::HtmlElement;

use crate::consts::OPTIONS_ATTRIBUTE;
use crate::error::Result;
use crate::host::HostElement;

use super::host::{BrowserHost, CanvasSurface};

#[derive(Clone)]
pub struct DomElement {
    element: HtmlElement,
}

impl DomElement {
    /// Wrap `element`, making it a positioning context for the overlay canvas
    pub fn new(host: &BrowserHost, element: HtmlElement) -> Result<Self> {
        let position = host
            .window()
            .get_computed_style(&element)?
            .map(|style| style.get_property_value("position"))
            .transpose()?;
        if position.as_deref() == Some("static") {
            element.style().set_property("position", "relative")?;
        }
        Ok(Self { element })
    }

    pub fn element(&self) -> &HtmlElement {
        &self.element
    }

    /// Viewport position of the element's top-left corner
    pub fn origin(&self) -> (f64, f64) {
        let rect = self.element.get_bounding_client_rect();
        (rect.left(), rect.top())
    }
}

impl HostElement for DomElement {
    type Surface = CanvasSurface;

    fn size(&self) -> (f64, f64) {
        let rect = self.element.get_bounding_client_rect();
        (rect.width(), rect.height())
    }

    fn options_attribute(&self) -> Option<String> {
        self.element.get_attribute(OPTIONS_ATTRIBUTE)
    }

    fn append_surface(&self, surface: &CanvasSurface) -> Result<()> {
        self.element.append_child(surface.canvas())?;
        Ok(())
    }
}
