// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod controller;
pub mod datetime;
pub mod dispatch;
pub mod forms;
pub mod ids;
pub mod model;
pub mod store;

pub use controller::*;
pub use datetime::*;
pub use dispatch::*;
pub use forms::*;
pub use ids::*;
pub use model::*;
pub use store::*;
