//! JavaScript-facing race controller.
//!
//! One [`MarbleRace`] owns the roster, the race state and the scene engine.
//! Start and reset drive race state and scene together. The roster can only
//! change while the race is ready; a mounted scene is rebuilt on each edit.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use marble_core::{
    Color, FinishCallback, MarblePatch, RaceConfig, RaceState, RaceStatus, RapierWorld, Roster,
    SceneEngine,
};
use wasm_bindgen::prelude::*;
use web_sys::Element;

use crate::canvas::CanvasScene;
use crate::frames::AnimationFrames;

/// Marbles on the roster when the page loads.
const INITIAL_MARBLES: usize = 5;

type Engine = SceneEngine<RapierWorld, CanvasScene>;

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct MarbleRace {
    roster: Roster,
    race: Rc<RefCell<RaceState>>,
    engine: Rc<RefCell<Engine>>,
    frames: AnimationFrames,
    container: RefCell<Option<Element>>,
    winner: Rc<Cell<Option<usize>>>,
    on_finish: Rc<RefCell<Option<js_sys::Function>>>,
}

#[wasm_bindgen]
impl MarbleRace {
    /// Creates a race from an optional JSON config.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<MarbleRace, JsValue> {
        let config = match config_json {
            Some(json) => RaceConfig::from_json(&json).map_err(js_error)?,
            None => RaceConfig::default(),
        };

        let frames = AnimationFrames::new();
        let engine = Rc::new(RefCell::new(SceneEngine::new(config, frames.clone())));
        tracing::info!("[marble] race controller created");

        Ok(Self {
            roster: Roster::with_defaults(INITIAL_MARBLES),
            race: Rc::new(RefCell::new(RaceState::new())),
            engine,
            frames,
            container: RefCell::new(None),
            winner: Rc::new(Cell::new(None)),
            on_finish: Rc::new(RefCell::new(None)),
        })
    }

    // ========================================================================
    // Roster
    // ========================================================================

    #[wasm_bindgen(js_name = addMarble)]
    pub fn add_marble(&mut self) -> Result<bool, JsValue> {
        self.edit_roster(Roster::add)
    }

    #[wasm_bindgen(js_name = removeMarble)]
    pub fn remove_marble(&mut self, index: usize) -> Result<bool, JsValue> {
        self.edit_roster(|roster| roster.remove(index))
    }

    /// Edits a marble's name and/or `#rrggbb` color.
    #[wasm_bindgen(js_name = updateMarble)]
    pub fn update_marble(
        &mut self,
        index: usize,
        name: Option<String>,
        color: Option<String>,
    ) -> Result<bool, JsValue> {
        let color = color
            .map(|c| c.parse::<Color>())
            .transpose()
            .map_err(js_error)?;
        self.edit_roster(|roster| roster.update(index, MarblePatch { name, color }))
    }

    #[wasm_bindgen(js_name = canAdd)]
    pub fn can_add(&self) -> bool {
        self.roster_editable() && self.roster.can_add()
    }

    #[wasm_bindgen(js_name = canRemove)]
    pub fn can_remove(&self) -> bool {
        self.roster_editable() && self.roster.can_remove()
    }

    /// Current roster as `[{ name, color }]`.
    pub fn marbles(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.roster.marbles()).map_err(JsValue::from)
    }

    // ========================================================================
    // Race
    // ========================================================================

    /// `"ready"`, `"running"` or `"finished"`.
    pub fn status(&self) -> String {
        self.race.borrow().status().as_str().to_string()
    }

    #[wasm_bindgen(js_name = winnerIndex)]
    pub fn winner_index(&self) -> Option<usize> {
        self.race.borrow().winner_index()
    }

    /// Starts the race. Needs a mounted scene and a ready race.
    pub fn start(&self) -> bool {
        let mut engine = self.engine.borrow_mut();
        if !engine.is_initialized() || !self.race.borrow_mut().start() {
            return false;
        }
        engine.start_race();
        true
    }

    /// Returns race and marbles to the start line.
    pub fn reset(&self) {
        self.race.borrow_mut().reset();
        self.engine.borrow_mut().reset_race();
    }

    // ========================================================================
    // Scene
    // ========================================================================

    /// Builds the scene for the current roster inside `container` and
    /// starts rendering. `on_finish` receives the winner's index.
    pub fn mount(
        &self,
        container: &Element,
        on_finish: Option<js_sys::Function>,
    ) -> Result<(), JsValue> {
        if self.engine.borrow().is_initialized() {
            return Ok(());
        }
        *self.on_finish.borrow_mut() = on_finish;

        let engine = Rc::downgrade(&self.engine);
        let notify = self.on_finish.clone();
        let pending = self.winner.clone();
        self.frames.bind(move |_timestamp: f64| {
            let Some(engine) = engine.upgrade() else {
                return;
            };
            engine.borrow_mut().frame();

            // No borrows held here: the callback may unmount or remount.
            let Some(index) = pending.take() else {
                return;
            };
            let callback = notify.borrow().clone();
            if let Some(callback) = callback {
                if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from(index)) {
                    tracing::error!("on_finish callback failed: {:?}", e);
                }
            }
        });

        *self.container.borrow_mut() = Some(container.clone());
        self.build_scene(container)
    }

    /// Stops rendering and removes the canvas. The race returns to ready.
    pub fn unmount(&self) {
        self.engine.borrow_mut().destroy();
        self.frames.unbind();
        self.race.borrow_mut().reset();
        self.winner.set(None);
        *self.container.borrow_mut() = None;
        *self.on_finish.borrow_mut() = None;
    }

    #[wasm_bindgen(js_name = isInitialized)]
    pub fn is_initialized(&self) -> bool {
        self.engine.borrow().is_initialized()
    }

    #[wasm_bindgen(js_name = raceActive)]
    pub fn race_active(&self) -> bool {
        self.engine.borrow().race_active()
    }

    #[wasm_bindgen(js_name = leadIndex)]
    pub fn lead_index(&self) -> Option<usize> {
        self.engine.borrow().lead_index()
    }

    /// Rotates the inspection camera (radians).
    pub fn orbit(&self, yaw: f32, pitch: f32) {
        self.engine.borrow_mut().orbit_camera(yaw, pitch);
    }

    pub fn zoom(&self, factor: f32) {
        self.engine.borrow_mut().zoom_camera(factor);
    }
}

impl MarbleRace {
    fn roster_editable(&self) -> bool {
        self.race.borrow().status() == RaceStatus::Ready
    }

    /// Applies `edit` while the race is ready, then rebuilds a mounted
    /// scene so body indices follow roster indices.
    fn edit_roster(&mut self, edit: impl FnOnce(&mut Roster) -> bool) -> Result<bool, JsValue> {
        if !self.roster_editable() {
            tracing::debug!("roster edit ignored while the race is {}", self.race.borrow().status());
            return Ok(false);
        }
        if !edit(&mut self.roster) {
            return Ok(false);
        }

        let container = self.container.borrow().clone();
        if let Some(container) = container {
            self.engine.borrow_mut().destroy();
            self.build_scene(&container)?;
        }
        Ok(true)
    }

    fn build_scene(&self, container: &Element) -> Result<(), JsValue> {
        let race = self.race.clone();
        let winner = self.winner.clone();
        let finished: FinishCallback = Box::new(move |index| {
            race.borrow_mut().finish(index);
            winner.set(Some(index));
        });

        self.engine
            .borrow_mut()
            .initialize_scene(container, self.roster.marbles(), Some(finished))
            .map_err(js_error)
    }
}

impl Drop for MarbleRace {
    fn drop(&mut self) {
        self.unmount();
    }
}
