/// Render pass node of the render graph.
///
/// A pass declares which resources it reads (inputs) and the single
/// resource it writes (output), plus the build callbacks that record its
/// blocks into the render context. Passes are registered once per frame
/// and consumed by `build()`.

use bitflags::bitflags;

use crate::render_context::{PriorityMask, RenderContext};
use crate::render_system::{ClearSpec, LoadMask, PassOps, StoreMask};
use super::{RenderGraph, ResourceRef, TargetSetId};

bitflags! {
    /// How a pass uses one of its inputs
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InputUsage: u32 {
        /// Sampled in a shader
        const SAMPLED = 1 << 0;
        /// Read through a storage binding
        const STORAGE = 1 << 1;
        /// Read as a (read-only) attachment
        const ATTACHMENT = 1 << 2;
        /// Reads the content left by the previous frame. Counts as a reader
        /// but does not order the pass after this frame's writer.
        const HISTORY = 1 << 3;
    }
}

/// Input reference of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassInput {
    pub resource: ResourceRef,
    pub usage: InputUsage,
}

impl PassInput {
    /// Whether this input orders the pass after the resource's writers
    pub fn is_ordering(&self) -> bool {
        !self.usage.contains(InputUsage::HISTORY)
    }
}

/// Output reference of a pass with its attachment operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassOutput {
    pub resource: ResourceRef,
    pub ops: PassOps,
}

/// Build callback of a pass
///
/// Invoked during `build()` with the graph (to look up acquired resources)
/// and the render context (to record blocks). Implemented for every
/// `FnMut(&RenderGraph, &mut RenderContext)` closure.
pub trait PassBuilder {
    fn build(&mut self, graph: &RenderGraph, ctx: &mut RenderContext);
}

impl<F> PassBuilder for F
where
    F: FnMut(&RenderGraph, &mut RenderContext),
{
    fn build(&mut self, graph: &RenderGraph, ctx: &mut RenderContext) {
        self(graph, ctx)
    }
}

/// Render pass node
pub struct RenderPass {
    name: String,
    inputs: Vec<PassInput>,
    output: Option<PassOutput>,
    builders: Vec<Box<dyn PassBuilder>>,
}

impl RenderPass {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            inputs: Vec::new(),
            output: None,
            builders: Vec::new(),
        }
    }

    /// Set the resource this pass writes
    ///
    /// `clear` is applied when the pass opens (or continues) a target set,
    /// `load` selects the aspects whose previous content is preserved and
    /// `store` the aspects written back. An `INVALID` id removes the output.
    pub fn set_output(
        &mut self,
        resource: impl Into<ResourceRef>,
        clear: ClearSpec,
        load: LoadMask,
        store: StoreMask,
    ) -> &mut Self {
        let resource = resource.into();
        self.output = if resource.is_invalid() {
            None
        } else {
            Some(PassOutput { resource, ops: PassOps { clear, load, store } })
        };
        self
    }

    /// Read a resource (sampled)
    pub fn add_input(&mut self, resource: impl Into<ResourceRef>) -> &mut Self {
        self.add_input_with_usage(resource, InputUsage::SAMPLED)
    }

    pub fn add_input_with_usage(&mut self, resource: impl Into<ResourceRef>, usage: InputUsage) -> &mut Self {
        self.inputs.push(PassInput { resource: resource.into(), usage });
        self
    }

    /// Append a build callback; callbacks run in registration order
    pub fn add_build<B: PassBuilder + 'static>(&mut self, builder: B) -> &mut Self {
        self.builders.push(Box::new(builder));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[PassInput] {
        &self.inputs
    }

    pub fn output(&self) -> Option<&PassOutput> {
        self.output.as_ref()
    }

    /// Output target set, if the pass renders into one (including `OUTPUT`)
    pub fn output_target(&self) -> Option<TargetSetId> {
        self.output.and_then(|o| o.resource.target_set())
    }

    /// Raw output id used for ordering within a depth level (0 without output)
    pub(crate) fn output_value(&self) -> u32 {
        self.output.map_or(0, |o| o.resource.value())
    }

    pub fn build_count(&self) -> usize {
        self.builders.len()
    }

    /// Run every build callback, merging the priority buckets after each one
    pub(crate) fn run_builders(&mut self, graph: &RenderGraph, ctx: &mut RenderContext) {
        for builder in &mut self.builders {
            builder.build(graph, ctx);
            ctx.merge_priority_into_draw(PriorityMask::all());
        }
    }
}

impl std::fmt::Debug for RenderPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPass")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("output", &self.output)
            .field("builders", &self.builders.len())
            .finish()
    }
}
