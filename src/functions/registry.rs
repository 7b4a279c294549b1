//! Resolution of [`CallableRef`]s to invocable functions.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{PipelineError, PipelineResult};
use crate::types::Frame;

use super::builtins::{self, BUILTIN_UNIT};
use super::{CallArgs, CallableRef, FunctionResult, TransformFn};

/// Module path of a locator: the file extension is stripped and path separators become `::`.
///
/// `"plugins/text.rs"` and `"plugins\\text.py"` both map to `"plugins::text"`.
pub fn unit_path(locator: &str) -> String {
    let stem = Path::new(locator).with_extension("");
    stem.to_string_lossy()
        .trim_start_matches("./")
        .replace(['/', '\\'], "::")
}

/// Resolves callable references.
///
/// Bare names always resolve against the built-in table, which is initialized once and never
/// changes. `(locator, symbol)` pairs resolve against units registered with
/// [`FunctionRegistry::register`]; the built-in table is also reachable as the unit
/// `transformations`.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    units: HashMap<String, HashMap<String, TransformFn>>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut units: Vec<&str> = self.units.keys().map(String::as_str).collect();
        units.sort_unstable();
        f.debug_struct("FunctionRegistry")
            .field("units", &units)
            .finish()
    }
}

impl FunctionRegistry {
    /// Create a registry with no external units; built-ins are always available.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `function` as `symbol` in the unit named by `locator`.
    ///
    /// The locator is normalized with [`unit_path`], so `"plugins/text.rs"` and
    /// `"plugins::text"` name the same unit. A later registration of the same symbol replaces
    /// the earlier one.
    pub fn register<F>(&mut self, locator: &str, symbol: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(Frame, &CallArgs) -> FunctionResult<Frame> + Send + Sync + 'static,
    {
        self.units
            .entry(unit_path(locator))
            .or_default()
            .insert(symbol.into(), Arc::new(function));
        self
    }

    /// Builder-style variant of [`FunctionRegistry::register`].
    pub fn with_function<F>(mut self, locator: &str, symbol: impl Into<String>, function: F) -> Self
    where
        F: Fn(Frame, &CallArgs) -> FunctionResult<Frame> + Send + Sync + 'static,
    {
        self.register(locator, symbol, function);
        self
    }

    /// Resolve a callable reference.
    ///
    /// Fails with [`PipelineError::Load`] if the name, unit or symbol is unknown.
    pub fn resolve(&self, callable: &CallableRef) -> PipelineResult<TransformFn> {
        match callable {
            CallableRef::Name(name) => builtins::lookup(name).ok_or_else(|| PipelineError::Load {
                callable: callable.to_string(),
                message: format!(
                    "no built-in function named '{name}' (available: {})",
                    builtins::names().join(", ")
                ),
            }),
            CallableRef::Located(locator, symbol) => {
                let unit = unit_path(locator);
                let registered = self.units.get(&unit);
                if registered.is_none() && unit != BUILTIN_UNIT {
                    return Err(PipelineError::Load {
                        callable: callable.to_string(),
                        message: format!("no unit '{unit}' is registered"),
                    });
                }

                registered
                    .and_then(|functions| functions.get(symbol).cloned())
                    .or_else(|| (unit == BUILTIN_UNIT).then(|| builtins::lookup(symbol)).flatten())
                    .ok_or_else(|| PipelineError::Load {
                        callable: callable.to_string(),
                        message: format!("unit '{unit}' has no function '{symbol}'"),
                    })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FunctionRegistry, unit_path};
    use crate::error::PipelineError;
    use crate::functions::{CallArgs, CallableRef};
    use crate::types::{Column, Frame, Value};

    #[test]
    fn unit_path_strips_extension_and_maps_separators() {
        assert_eq!(unit_path("plugins/text.py"), "plugins::text");
        assert_eq!(unit_path("plugins\\text.rs"), "plugins::text");
        assert_eq!(unit_path("./transformations.py"), "transformations");
        assert_eq!(unit_path("plugins::text"), "plugins::text");
    }

    #[test]
    fn bare_names_resolve_to_builtins() {
        let registry = FunctionRegistry::new();
        assert!(registry
            .resolve(&CallableRef::Name("greater_than".to_string()))
            .is_ok());
        let err = registry
            .resolve(&CallableRef::Name("nope".to_string()))
            .err()
            .unwrap();
        assert!(matches!(err, PipelineError::Load { .. }));
    }

    #[test]
    fn builtins_are_reachable_as_a_unit() {
        let registry = FunctionRegistry::new();
        let callable = CallableRef::Located("transformations.py".to_string(), "notnull".to_string());
        assert!(registry.resolve(&callable).is_ok());
    }

    #[test]
    fn registered_functions_resolve_by_locator() {
        let registry = FunctionRegistry::new().with_function("plugins/math.rs", "double", |frame, _args| {
            match frame {
                Frame::Column(col) => {
                    let values = col
                        .values
                        .iter()
                        .map(|v| match v {
                            Value::Int64(n) => Value::Int64(n * 2),
                            other => other.clone(),
                        })
                        .collect();
                    Ok(Frame::Column(Column::with_index(col.name(), values, col.index.clone())))
                }
                other => Ok(other),
            }
        });

        let f = registry
            .resolve(&CallableRef::Located("plugins/math.py".to_string(), "double".to_string()))
            .unwrap();
        let out = f(Frame::Column(Column::new("n", vec![Value::Int64(4)])), &CallArgs::default()).unwrap();
        assert!(matches!(out, Frame::Column(ref c) if c.values == vec![Value::Int64(8)]));
    }

    #[test]
    fn unknown_unit_or_symbol_is_a_load_error() {
        let registry = FunctionRegistry::new().with_function("plugins/math.rs", "double", |f, _| Ok(f));

        let missing_unit = CallableRef::Located("plugins/other.rs".to_string(), "double".to_string());
        assert!(matches!(
            registry.resolve(&missing_unit).err().unwrap(),
            PipelineError::Load { .. }
        ));

        let missing_symbol = CallableRef::Located("plugins/math.rs".to_string(), "triple".to_string());
        assert!(matches!(
            registry.resolve(&missing_symbol).err().unwrap(),
            PipelineError::Load { .. }
        ));
    }
}
