// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod session;
pub mod sync;

pub use session::SessionGate;
pub use sync::SyncEngine;
