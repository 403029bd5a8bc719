//! Host-side render pass: evaluates every flow once per frame and keeps the
//! wheel listeners in step with what is on screen.

use crate::flows::FlowRecord;
use crate::placement::{
    Placement, PlacementOptions, ScreenTransform, SkipReason, TooltipSide, Viewport, place,
};
use crate::surface::{SharedSurface, Surface, WheelGuard};

use log::{debug, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipContent {
    pub identity: String,
    pub net_flow: f64,
    pub carbon_intensity: f64,
    pub side: TooltipSide,
}

/// What the rendering collaborator needs to draw one arrow
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderInstruction {
    pub identity: String,
    pub asset_key: String,
    pub image_source: String,
    pub transform: ScreenTransform,
    pub tooltip: TooltipContent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    pub instructions: Vec<RenderInstruction>,
    pub skipped: BTreeMap<SkipReason, usize>,
    pub duplicates: usize,
}

impl Frame {
    pub fn rendered(&self) -> usize {
        self.instructions.len()
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}

pub struct ArrowLayer<S: Surface> {
    surface: SharedSurface<S>,
    options: PlacementOptions,
    mounted: HashMap<String, WheelGuard<S>>,
}

impl<S: Surface> ArrowLayer<S> {
    pub fn new(surface: SharedSurface<S>, options: PlacementOptions) -> Self {
        Self {
            surface,
            options,
            mounted: HashMap::new(),
        }
    }

    pub fn options(&self) -> &PlacementOptions {
        &self.options
    }

    /// Number of arrows currently holding a wheel listener
    pub fn mounted(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_mounted(&self, identity: &str) -> bool {
        self.mounted.contains_key(identity)
    }

    /// Runs one render pass over `records`.
    ///
    /// Arrows that become visible get a wheel listener, arrows that are no
    /// longer drawn release theirs. Records repeating an identity already seen
    /// in this pass are dropped.
    pub fn frame(
        &mut self,
        records: &[FlowRecord],
        viewport: &Viewport<'_>,
        colorblind_mode: bool,
    ) -> Frame {
        let mut frame = Frame::default();
        let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());

        for record in records {
            if !seen.insert(record.identity.as_str()) {
                warn!("duplicate exchange {} ignored in this frame", record.identity);
                frame.duplicates += 1;
                continue;
            }

            match place(record, viewport, colorblind_mode, &self.options) {
                Placement::Skip(reason) => {
                    *frame.skipped.entry(reason).or_insert(0) += 1;
                }
                Placement::Render {
                    transform,
                    asset_key,
                    tooltip_side,
                } => {
                    let image_source = self.options.asset_style.image_source(&asset_key);
                    frame.instructions.push(RenderInstruction {
                        identity: record.identity.clone(),
                        asset_key,
                        image_source,
                        transform,
                        tooltip: TooltipContent {
                            identity: record.identity.clone(),
                            net_flow: record.net_flow,
                            carbon_intensity: record.carbon_intensity,
                            side: tooltip_side,
                        },
                    });
                }
            }
        }

        self.reconcile(&frame);
        debug!(
            "frame: {} rendered, {} skipped, {} mounted",
            frame.rendered(),
            frame.skipped_total(),
            self.mounted.len()
        );
        frame
    }

    /// Listeners are attached in record order
    fn reconcile(&mut self, frame: &Frame) {
        let visible: HashSet<&str> = frame
            .instructions
            .iter()
            .map(|i| i.identity.as_str())
            .collect();

        // Unmount first so a surface never holds listeners for arrows gone
        self.mounted.retain(|identity, _| visible.contains(identity.as_str()));

        for inst in &frame.instructions {
            if !self.mounted.contains_key(&inst.identity) {
                let guard = WheelGuard::attach(&self.surface, &inst.identity);
                self.mounted.insert(inst.identity.clone(), guard);
            }
        }
    }

    /// Releases every wheel listener
    pub fn teardown(&mut self) {
        if !self.mounted.is_empty() {
            debug!("tearing down {} arrows", self.mounted.len());
        }
        self.mounted.clear();
    }
}

impl<S: Surface> Drop for ArrowLayer<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
