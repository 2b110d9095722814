//! SharpCap Sequence Generator
//!
//! Builds SharpCap sequencer scripts (`.scs`) from an interactive observing
//! plan: optional start-time wait, unpark, one imaging block per target and
//! shutdown.
//!
//! ## Features
//!
//! - Data-driven equipment profiles with per-filter capture parameters
//! - Catalog lookup with fallback to manual coordinate entry
//! - Platesolve strategies: single, repeated and equator-assisted
//! - Flexure compensation by splitting long captures into re-anchored blocks
//! - Filter wheel support with RGB compound targets
//! - Atomic, write-once output through [`SequenceSink`]

mod catalog;
mod config;
mod coordinates;
mod directive;
mod emitter;
mod error;
mod frames;
mod input;
mod profiles;
mod resolver;
mod session;
mod sink;

pub use catalog::{Catalog, CsvCatalog, CATALOG_ROW_FIELDS};
pub use config::{GeneratorConfig, Timings, CONFIG_FILE_NAME};
pub use coordinates::{Coordinates, Declination, RightAscension};
pub use directive::{Directive, FinishedSequence, InstructionSequence, ScriptLine, FITS_OUTPUT_FORMAT, INDENT};
pub use emitter::{BlockSummary, Target, TargetBlockEmitter};
pub use error::{ConfigurationError, InputError, LookupMiss, SessionError, SessionResult, SinkError};
pub use frames::{frame_count, hours_after_allowance, split_into_blocks, MAX_CAPTURE_HOURS};
pub use input::{InputProvider, ScriptedInput};
pub use profiles::{
    builtin_profiles, Band, CaptureParameters, EquipmentProfile, FilterChoice, FilterEntry, FilterKind,
    FilterWheel, FlexureCaps, PlatesolveStrategy, SensorKind, RGB_CHANNELS,
};
pub use resolver::{resolve_by_catalog, resolve_direct, resolve_target, ResolvedCoordinates};
pub use session::{
    ask_start_time, choose_filter, collect_settings, collect_target, generate, run_session, Cooler,
    SessionDriver, SessionOutcome, SessionPhase, SessionState, TargetSummary,
};
pub use sink::{FileSink, MemorySink, SequenceSink};
