//! WebAssembly bindings for the Monopoly engine.
//!
//! This module exposes the game engine to JavaScript through wasm-bindgen.
//! Everything crosses the boundary as JSON.

use wasm_bindgen::prelude::*;

use crate::actions::Action;
use crate::bot;
use crate::config::{GameSettings, PlayerSeat};
use crate::game::GameState;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed game wrapper
#[wasm_bindgen]
pub struct WasmGame {
    state: GameState,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a game from a JSON array of seats and optional settings JSON
    #[wasm_bindgen(constructor)]
    pub fn new(seats_json: &str, settings_json: Option<String>, seed: u64) -> Result<WasmGame, JsValue> {
        let seats: Vec<PlayerSeat> = serde_json::from_str(seats_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid seats: {}", e)))?;
        let settings: GameSettings = match settings_json {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| JsValue::from_str(&format!("Invalid settings: {}", e)))?,
            None => GameSettings::default(),
        };

        let state = GameState::new(seats, settings, seed).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WasmGame { state })
    }

    /// Get the current game state as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        serde_json::to_string(&self.state).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get the player who must act next
    #[wasm_bindgen(js_name = getActingPlayer)]
    pub fn get_acting_player(&self) -> Option<u8> {
        self.state.acting_player()
    }

    /// Get valid actions for the acting player as JSON array
    #[wasm_bindgen(js_name = getValidActions)]
    pub fn get_valid_actions(&self) -> String {
        serde_json::to_string(&self.state.valid_actions()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Apply an action from JSON. Refused actions still succeed; read
    /// `lastAction` for the reason.
    #[wasm_bindgen(js_name = applyAction)]
    pub fn apply_action(&mut self, action_json: &str) -> Result<String, JsValue> {
        let action: Action = serde_json::from_str(action_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid action JSON: {}", e)))?;

        self.state = self.state.apply(action);
        Ok(self.state.last_action.clone())
    }

    /// Get the bot's proposed action as JSON, or null when a human must act
    #[wasm_bindgen(js_name = getBotAction)]
    pub fn get_bot_action(&self) -> String {
        match bot::decide(&self.state) {
            Some(action) => serde_json::to_string(&action).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }

    /// Get the current phase as JSON
    #[wasm_bindgen(js_name = getPhase)]
    pub fn get_phase(&self) -> String {
        serde_json::to_string(&self.state.phase).unwrap_or_else(|_| "\"Unknown\"".to_string())
    }

    /// Check if the game is finished
    #[wasm_bindgen(js_name = isFinished)]
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Get the winner (if game is finished)
    #[wasm_bindgen(js_name = getWinner)]
    pub fn get_winner(&self) -> Option<u8> {
        self.state.winner()
    }

    /// Get the last dice roll
    #[wasm_bindgen(js_name = getDice)]
    pub fn get_dice(&self) -> Vec<u8> {
        vec![self.state.dice.0, self.state.dice.1]
    }

    /// Get a specific player's state as JSON
    #[wasm_bindgen(js_name = getPlayer)]
    pub fn get_player(&self, player: u8) -> String {
        match self.state.get_player(player) {
            Some(p) => serde_json::to_string(p).unwrap_or_else(|_| "{}".to_string()),
            None => "null".to_string(),
        }
    }
}
