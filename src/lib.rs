//! Mazebot - headless maze-solving bot AI
//!
//! A bot controller that perceives keys, doors and exits, navigates
//! toward them, and detects and recovers from runtime failures (stuck
//! bots, lost perception, tasks that stop progressing). All engine
//! services are abstracted behind collaborator traits so the whole
//! thing runs and tests headless.

pub mod controller;
pub mod core;
pub mod facts;
pub mod sim;
pub mod telemetry;
pub mod world;
