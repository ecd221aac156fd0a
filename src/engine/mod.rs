//! Conversion engines and the handle that owns them.

mod rubato_engine;

pub use rubato_engine::RubatoEngine;

use std::ops::{Deref, DerefMut};

use crate::converter::ConverterOptions;
use crate::traits::{ConversionEngine, EngineError};

/// Owns an initialized engine and destroys it exactly once when dropped.
///
/// A handle only exists once `init` has succeeded, so a failed construction
/// leaves nothing behind to tear down.
pub struct EngineHandle<E: ConversionEngine> {
    engine: E,
}

impl<E: ConversionEngine> EngineHandle<E> {
    pub fn init(options: &ConverterOptions) -> Result<Self, EngineError> {
        E::init(options).map(|engine| Self { engine })
    }
}

impl<E: ConversionEngine> Deref for EngineHandle<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.engine
    }
}

impl<E: ConversionEngine> DerefMut for EngineHandle<E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

impl<E: ConversionEngine> Drop for EngineHandle<E> {
    fn drop(&mut self) {
        self.engine.destroy();
    }
}
