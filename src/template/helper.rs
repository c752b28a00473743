// Bridge from handlebars helper calls into the helper registry
//
// All helpers of one evaluator share a single render state. Subexpression
// arguments are evaluated before the outer call runs, so the lock is never
// taken twice.

use crate::data::Table;
use crate::helpers::value::Value;
use crate::helpers::{Helper, HelperRegistry, HelperScope};
use crate::host::{DefaultPalette, HostServices};
use handlebars::{Context, Handlebars, HelperDef, RenderContext, RenderError, RenderErrorReason, ScopedJson};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Registry, table and host services visible to helpers during one render.
pub struct RenderState {
    pub registry: HelperRegistry,
    pub table: Table,
    pub host: Arc<dyn HostServices>,
}

impl Default for RenderState {
    fn default() -> Self {
        Self { registry: HelperRegistry::new(), table: Table::empty(), host: Arc::new(DefaultPalette::default()) }
    }
}

#[derive(Clone, Default)]
pub struct SharedState(Arc<Mutex<RenderState>>);

impl SharedState {
    /// A helper that panicked mid-render leaves the state usable; the next
    /// render resets it anyway.
    pub fn lock(&self) -> MutexGuard<'_, RenderState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One helper name registered with handlebars.
pub struct BoundHelper {
    helper: Helper,
    state: SharedState,
}

impl BoundHelper {
    pub fn new(helper: Helper, state: SharedState) -> Self {
        Self { helper, state }
    }
}

impl HelperDef for BoundHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &handlebars::Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let args: Vec<Value> = h
            .params()
            .iter()
            .map(|param| if param.is_value_missing() { Value::Undefined } else { Value::from_json(param.value()) })
            .collect();

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let mut scope = HelperScope { registry: &mut state.registry, table: &state.table, host: state.host.as_ref() };
        let value = scope
            .call(self.helper, args)
            .map_err(|e| RenderErrorReason::Other(e.to_string()))?;

        Ok(match value {
            Value::Undefined => ScopedJson::Missing,
            value => ScopedJson::Derived(value.to_json()),
        })
    }
}
