//! Overlay factory: marker specs in, live markers out.
//!
//! A batch never fails as a whole. Each spec that cannot be built is skipped and
//! reported in the [`BuildReport`]; the rest are built in order.

use crate::events::{bind_events, Event, Events, MARKER_EVENTS};
use crate::logging::diagnose;
use crate::marker::{InfoContent, Marker, MarkerOptions, MarkerSpec};
use crate::registry::Context;
use crate::service::{InfoWindowHandle, MapHandle, MarkerHandle};
use crate::{error::Result, Error};
use std::rc::Rc;

/// Outcome of building a batch of markers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// Markers appended to the anchor's sequence
    pub added: usize,
    /// Specs that produced no marker, with the reason
    pub skipped: Vec<Error>,
    /// Markers that were built with some option dropped
    pub warnings: Vec<Error>,
}

impl BuildReport {
    pub(crate) fn merge(&mut self, other: BuildReport) {
        self.added += other.added;
        self.skipped.extend(other.skipped);
        self.warnings.extend(other.warnings);
    }
}

/// Build live markers for `specs` on `map`, in spec order.
pub fn build_markers(
    ctx: &Context<'_>,
    map: &MapHandle,
    specs: &[MarkerSpec],
) -> (Vec<Marker>, BuildReport) {
    let debug = ctx.config.debug;
    let mut markers = Vec::with_capacity(specs.len());
    let mut report = BuildReport::default();

    for (index, spec) in specs.iter().enumerate() {
        match build_marker(ctx, map, index, spec) {
            Ok((marker, warnings)) => {
                for warning in &warnings {
                    diagnose(debug, warning);
                }
                report.warnings.extend(warnings);
                markers.push(marker);
            }
            Err(e) => {
                diagnose(debug, &e);
                report.skipped.push(e);
            }
        }
    }

    report.added = markers.len();
    (markers, report)
}

fn build_marker(
    ctx: &Context<'_>,
    map: &MapHandle,
    index: usize,
    spec: &MarkerSpec,
) -> Result<(Marker, Vec<Error>)> {
    let (options, mut warnings) = MarkerOptions::parse(index, &spec.options)?;
    let overlay = ctx.service.create_marker(map, &options);

    if !spec.events.is_empty() {
        note_unknown_events(&spec.events);
        bind_events(&*overlay, &spec.events);
    }

    let info_window = match &options.info {
        Some(info) => match attach_info_window(ctx, map, &overlay, info) {
            Ok(window) => Some(window),
            Err(e) => {
                warnings.push(e);
                None
            }
        },
        None => None,
    };

    if info_window.is_some() && options.initial_open {
        overlay.trigger("click");
    }

    Ok((
        Marker::new(overlay, options, spec.options.clone(), info_window),
        warnings,
    ))
}

/// Create an info window for `marker` that opens on click.
///
/// The listener holds only weak references so the marker does not keep itself alive.
fn attach_info_window(
    ctx: &Context<'_>,
    map: &MapHandle,
    marker: &MarkerHandle,
    info: &InfoContent,
) -> Result<InfoWindowHandle> {
    let content = match info {
        InfoContent::Selector(selector) => {
            let html = ctx
                .document
                .inner_html(selector)
                .ok_or_else(|| Error::MissingContent(selector.clone()))?;
            ctx.document.hide(selector);
            html
        }
        InfoContent::Text(text) => text.clone(),
    };

    let window = ctx.service.create_info_window(&content);
    let target = Rc::clone(&window);
    let map = Rc::downgrade(map);
    let anchor = Rc::downgrade(marker);
    marker.add_listener(
        "click",
        Rc::new(move |_: &Event| {
            if let (Some(map), Some(marker)) = (map.upgrade(), anchor.upgrade()) {
                target.open(&map, &marker);
            }
        }),
    );

    Ok(window)
}

fn note_unknown_events(events: &Events) {
    for name in events.names() {
        if !MARKER_EVENTS.contains(&name) {
            tracing::debug!(event = name, "binding listener for non-standard marker event");
        }
    }
}
