// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod controls;
pub mod editor;
pub mod key;
pub mod locate;
pub mod model;
pub mod persist;
pub mod snapshot;
pub mod state;
pub mod storage;

pub use controls::*;
pub use editor::*;
pub use key::*;
pub use locate::*;
pub use model::*;
pub use persist::*;
pub use snapshot::*;
pub use state::*;
pub use storage::*;
