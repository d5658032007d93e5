//! WASM bindings for the browser presentation layer

#![cfg(feature = "wasm")]

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Function;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::{
    payoff, EngineError, GameResult, Move, PopulationSimulation, SimulationConfig,
    SimulationObserver, StatisticsSnapshot, StrategyInfo, StrategyRegistry,
};

/// Serialize with plain JS objects (not `Map`) so `stats.strategyStats[id]` works
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)).into())
}

fn engine_error(e: EngineError) -> JsValue {
    JsError::from(e).into()
}

fn parse_move(value: &str) -> Result<Move, JsError> {
    match value {
        "cooperate" => Ok(Move::Cooperate),
        "defect" => Ok(Move::Defect),
        _ => Err(JsError::new(&format!("Unknown move: {}", value))),
    }
}

/// Engine notification waiting for the engine borrow to be released
enum Notification {
    GameComplete(GameResult),
    ProgressUpdate(StatisticsSnapshot),
    SimulationComplete(StatisticsSnapshot),
}

/// Queues notifications raised while the engine is mutably borrowed
///
/// JS callbacks routinely call back into the simulation (`getStatistics()`,
/// `isComplete`), so they must run only after the engine call has returned.
struct QueueObserver(Rc<RefCell<Vec<Notification>>>);

impl SimulationObserver for QueueObserver {
    fn on_game_complete(&mut self, result: &GameResult) {
        self.0.borrow_mut().push(Notification::GameComplete(*result));
    }

    fn on_progress_update(&mut self, snapshot: &StatisticsSnapshot) {
        self.0
            .borrow_mut()
            .push(Notification::ProgressUpdate(snapshot.clone()));
    }

    fn on_simulation_complete(&mut self, snapshot: &StatisticsSnapshot) {
        self.0
            .borrow_mut()
            .push(Notification::SimulationComplete(snapshot.clone()));
    }
}

#[derive(Default)]
struct Callbacks {
    on_game_complete: Option<Function>,
    on_progress_update: Option<Function>,
    on_simulation_complete: Option<Function>,
}

/// Population simulation exposed to JS
///
/// Mirrors the engine contract: `initialize()`, `runGame()`,
/// `getStatistics()`, `isComplete`, and assignable `onGameComplete`,
/// `onProgressUpdate`, `onSimulationComplete` callbacks. Callbacks fire
/// after the triggering call has updated the engine, and an exception thrown
/// by a callback is rethrown from that call.
#[wasm_bindgen(js_name = PopulationSimulation)]
pub struct WasmSimulation {
    inner: RefCell<PopulationSimulation>,
    pending: Rc<RefCell<Vec<Notification>>>,
    callbacks: RefCell<Callbacks>,
}

impl WasmSimulation {
    /// Deliver queued notifications in order, stopping at the first throw
    fn dispatch(&self) -> Result<(), JsValue> {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());

        for notification in pending {
            // Clone the handler out so a callback may reassign it
            let (callback, arg) = {
                let callbacks = self.callbacks.borrow();
                match &notification {
                    Notification::GameComplete(result) => {
                        (callbacks.on_game_complete.clone(), to_js(result)?)
                    }
                    Notification::ProgressUpdate(snapshot) => {
                        (callbacks.on_progress_update.clone(), to_js(snapshot)?)
                    }
                    Notification::SimulationComplete(snapshot) => {
                        (callbacks.on_simulation_complete.clone(), to_js(snapshot)?)
                    }
                }
            };

            if let Some(callback) = callback {
                callback.call1(&JsValue::NULL, &arg)?;
            }
        }

        Ok(())
    }
}

#[wasm_bindgen(js_class = PopulationSimulation)]
impl WasmSimulation {
    /// Create from a config object, e.g.
    /// `{strategies: {"tit-for-tat": 0, "always-defect": 0}, proportion: 0.5, ...}`
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmSimulation, JsError> {
        let config: SimulationConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsError::new(&format!("Invalid configuration: {}", e)))?;

        let pending = Rc::new(RefCell::new(Vec::new()));
        let mut inner = PopulationSimulation::new(config);
        inner.add_observer(Box::new(QueueObserver(Rc::clone(&pending))));

        Ok(Self {
            inner: RefCell::new(inner),
            pending,
            callbacks: RefCell::new(Callbacks::default()),
        })
    }

    pub fn initialize(&self) -> Result<(), JsValue> {
        self.pending.borrow_mut().clear();
        self.inner.borrow_mut().initialize().map_err(engine_error)
    }

    /// Play one game; returns the GameResult or `undefined` once complete
    #[wasm_bindgen(js_name = runGame)]
    pub fn run_game(&self) -> Result<JsValue, JsValue> {
        let result = self.inner.borrow_mut().run_game().map_err(engine_error)?;
        self.dispatch()?;

        match result {
            Some(result) => to_js(&result),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    #[wasm_bindgen(js_name = getStatistics)]
    pub fn get_statistics(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.borrow().get_statistics())
    }

    #[wasm_bindgen(getter, js_name = isComplete)]
    pub fn is_complete(&self) -> bool {
        self.inner.borrow().is_complete()
    }

    /// Mark the run stopped; fires `onSimulationComplete` if it was active
    pub fn stop(&self) -> Result<bool, JsValue> {
        let stopped = self.inner.borrow_mut().stop();
        self.dispatch()?;
        Ok(stopped)
    }

    #[wasm_bindgen(setter, js_name = onGameComplete)]
    pub fn set_on_game_complete(&self, callback: Option<Function>) {
        self.callbacks.borrow_mut().on_game_complete = callback;
    }

    #[wasm_bindgen(setter, js_name = onProgressUpdate)]
    pub fn set_on_progress_update(&self, callback: Option<Function>) {
        self.callbacks.borrow_mut().on_progress_update = callback;
    }

    #[wasm_bindgen(setter, js_name = onSimulationComplete)]
    pub fn set_on_simulation_complete(&self, callback: Option<Function>) {
        self.callbacks.borrow_mut().on_simulation_complete = callback;
    }
}

/// Get all available strategies (id, name, description)
#[wasm_bindgen(js_name = getStrategyTypes)]
pub fn get_strategy_types() -> Result<JsValue, JsValue> {
    let types: Vec<StrategyInfo> = StrategyRegistry::with_builtins()
        .iter()
        .map(|s| s.info())
        .collect();
    to_js(&types)
}

/// Get the human-readable description of a built-in strategy
#[wasm_bindgen(js_name = getStrategyDescription)]
pub fn get_strategy_description(id: &str) -> Result<String, JsError> {
    let registry = StrategyRegistry::with_builtins();
    Ok(registry.get(id)?.description.clone())
}

/// Resolve one game's payoffs; moves are `"cooperate"` or `"defect"`
#[wasm_bindgen(js_name = resolvePayoff)]
pub fn resolve_payoff(move_a: &str, move_b: &str) -> Result<Vec<u8>, JsError> {
    let (a, b) = payoff(parse_move(move_a)?, parse_move(move_b)?);
    Ok(vec![a, b])
}
