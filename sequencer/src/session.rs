//! Session lifecycle
//!
//! `Idle → TimeWait (optional) → Unparked → PerTargetLoop → ShuttingDown → Closed`
//!
//! [`SessionDriver`] owns the instruction sequence and walks these phases;
//! [`run_session`] drives it from operator input and [`generate`] hands the
//! finished script to a sink. An error at any point drops the driver, so a
//! partial script is never written.

use crate::catalog::Catalog;
use crate::config::GeneratorConfig;
use crate::directive::{Directive, FinishedSequence, InstructionSequence};
use crate::emitter::{BlockSummary, Target, TargetBlockEmitter};
use crate::error::{ConfigurationError, InputError, SessionResult};
use crate::frames::MAX_CAPTURE_HOURS;
use crate::input::InputProvider;
use crate::profiles::{EquipmentProfile, FilterChoice};
use crate::resolver::resolve_target;
use crate::sink::SequenceSink;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Requested sensor cooling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cooler {
    Disabled,
    /// Target temperature in °C
    Target(i32),
}

impl Cooler {
    /// Interpret an entered temperature; `sentinel` means no cooling
    pub fn from_setting(temperature: i32, sentinel: i32) -> Self {
        if temperature == sentinel {
            Cooler::Disabled
        } else {
            Cooler::Target(temperature)
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Cooler::Target(_))
    }
}

/// Settings fixed at session start, read-only afterwards
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub cooler: Cooler,
    pub profile: EquipmentProfile,
    /// Local time to wait for before unparking
    pub start_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Idle,
    TimeWait,
    Unparked,
    PerTargetLoop,
    ShuttingDown,
    Closed,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::TimeWait => "time wait",
            SessionPhase::Unparked => "unparked",
            SessionPhase::PerTargetLoop => "per-target loop",
            SessionPhase::ShuttingDown => "shutting down",
            SessionPhase::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Frames planned for one emitted target
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSummary {
    pub name: String,
    pub filter: FilterChoice,
    pub block: BlockSummary,
}

/// Builds one session's script
pub struct SessionDriver<'a> {
    config: &'a GeneratorConfig,
    state: SessionState,
    sequence: InstructionSequence,
    phase: SessionPhase,
    targets: Vec<TargetSummary>,
}

impl<'a> SessionDriver<'a> {
    /// Open the sequence and emit the preamble: the optional start-time wait
    /// followed by the unpark block
    pub fn start(config: &'a GeneratorConfig, state: SessionState) -> Self {
        tracing::info!(
            "Starting session for '{}' (cooler: {:?}, start: {:?})",
            state.profile.name,
            state.cooler,
            state.start_time
        );
        let mut driver = Self {
            config,
            state,
            sequence: InstructionSequence::begin(),
            phase: SessionPhase::Idle,
            targets: Vec::new(),
        };

        if let Some(time) = driver.state.start_time {
            driver.transition(SessionPhase::TimeWait);
            driver.sequence.push(Directive::WaitUntilLocalTime(time));
        }

        driver.transition(SessionPhase::Unparked);
        let setup = config.timings.setup_delay_secs;
        driver.sequence.push(Directive::Delay(setup));
        driver.sequence.push(Directive::MountUnpark);
        driver.sequence.push(Directive::MountUnpark);
        driver.sequence.push(Directive::Delay(setup));
        driver.sequence.push(Directive::StillMode);
        driver
    }

    fn transition(&mut self, next: SessionPhase) {
        if self.phase != next {
            tracing::debug!("Session phase {} -> {}", self.phase, next);
            self.phase = next;
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn targets(&self) -> &[TargetSummary] {
        &self.targets
    }

    /// Emit the imaging block for one target
    pub fn add_target(&mut self, target: &Target) -> Result<&TargetSummary, ConfigurationError> {
        self.transition(SessionPhase::PerTargetLoop);
        let first_target = self.targets.is_empty();
        let block = TargetBlockEmitter::new(self.config, &self.state).emit(&mut self.sequence, target, first_target)?;
        self.targets.push(TargetSummary {
            name: target.name.clone(),
            filter: target.filter,
            block,
        });
        Ok(&self.targets[self.targets.len() - 1])
    }

    /// Emit the shutdown block and close the sequence
    pub fn finish(mut self) -> FinishedSequence {
        self.transition(SessionPhase::ShuttingDown);
        self.sequence.push(Directive::MountPark);
        if self.state.cooler.is_enabled() {
            self.sequence.push(Directive::SetCoolerOff);
        }
        if let Some(wheel) = self.state.profile.filter_wheel() {
            self.sequence.push(Directive::WheelMoveTo(wheel.home_position));
        }
        let finished = self.sequence.finish();
        self.phase = SessionPhase::Closed;
        tracing::info!(
            "Session closed with {} target(s), {} lines",
            self.targets.len(),
            finished.lines().len()
        );
        finished
    }
}

/// Result of a completed session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub sequence: FinishedSequence,
    pub targets: Vec<TargetSummary>,
}

fn parse_hour(text: &str) -> Result<u32, String> {
    let hour: u32 = text
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a valid hour", text.trim()))?;
    if hour > 23 {
        return Err(format!("Hour must be from 0 to 23, got {}", hour));
    }
    Ok(hour)
}

fn parse_minute(text: &str) -> Result<u32, String> {
    let minute: u32 = text
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a valid minute", text.trim()))?;
    if minute > 59 {
        return Err(format!("Minute must be from 0 to 59, got {}", minute));
    }
    Ok(minute)
}

fn parse_temperature(text: &str) -> Result<i32, String> {
    text.trim()
        .parse()
        .map_err(|_| format!("'{}' is not a whole number of degrees", text.trim()))
}

fn parse_hours(text: &str) -> Result<f64, String> {
    let hours: f64 = text
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number of hours", text.trim()))?;
    if !hours.is_finite() || hours <= 0.0 {
        return Err(format!("Capture time must be positive, got {}", text.trim()));
    }
    if hours > MAX_CAPTURE_HOURS {
        return Err(format!("Capture time must be at most {} hours, got {}", MAX_CAPTURE_HOURS, text.trim()));
    }
    Ok(hours)
}

/// Target names end up inside a quoted `TARGETNAME` argument
fn parse_target_name(text: &str) -> Result<String, String> {
    let name = text.trim();
    if name.is_empty() {
        return Err("Target name must not be empty".to_string());
    }
    if name.contains('"') {
        return Err("Target name must not contain '\"'".to_string());
    }
    if name.chars().any(char::is_control) {
        return Err("Target name must not contain control characters".to_string());
    }
    Ok(name.to_string())
}

/// Ask for the optional start time
pub fn ask_start_time<I: InputProvider>(input: &mut I) -> Result<Option<NaiveTime>, InputError> {
    if !input.ask_yes_no("Set a start time? (y/n)")? {
        return Ok(None);
    }
    loop {
        let hour = input.ask_parsed("Enter hour start (24h)", parse_hour)?;
        let minute = input.ask_parsed("Enter minute start", parse_minute)?;
        match NaiveTime::from_hms_opt(hour, minute, 0) {
            Some(time) => return Ok(Some(time)),
            None => input.notify(&format!("{}:{:02} is not a valid time. Please try again.", hour, minute)),
        }
    }
}

/// Ask for cooler temperature, telescope and start time
pub fn collect_settings<I: InputProvider>(
    input: &mut I,
    config: &GeneratorConfig,
) -> SessionResult<SessionState> {
    let start_time = ask_start_time(input)?;

    let question = format!("Set cooler temp C ({} to disable)", config.cooler_disabled_sentinel);
    let temperature = input.ask_parsed(&question, parse_temperature)?;
    let cooler = Cooler::from_setting(temperature, config.cooler_disabled_sentinel);

    let profile = match config.profiles.as_slice() {
        [] => return Err(ConfigurationError::NoProfiles.into()),
        [only] => only.clone(),
        profiles => {
            let options: Vec<(&str, usize)> = profiles
                .iter()
                .enumerate()
                .map(|(index, profile)| (profile.name.as_str(), index))
                .collect();
            let index = input.ask_menu("Select your telescope:", &options)?;
            profiles[index].clone()
        }
    };
    tracing::info!("Selected profile '{}'", profile.name);

    Ok(SessionState {
        cooler,
        profile,
        start_time,
    })
}

/// Filter menu restricted to what the profile supports
pub fn choose_filter<I: InputProvider>(
    input: &mut I,
    profile: &EquipmentProfile,
) -> SessionResult<FilterChoice> {
    let choices = profile.filter_choices();
    if choices.is_empty() {
        return Err(ConfigurationError::EmptyProfile(profile.name.clone()).into());
    }
    let options: Vec<(&str, FilterChoice)> = choices.iter().map(|c| (c.label(), *c)).collect();
    let choice = input.ask_menu("Select your filter:", &options)?;
    tracing::debug!("Selected filter {}", choice.label());
    Ok(choice)
}

/// Resolve coordinates, name and capture time for one target
pub fn collect_target<I: InputProvider>(
    input: &mut I,
    catalog: Option<&dyn Catalog>,
    filter: FilterChoice,
) -> Result<Target, InputError> {
    let resolved = resolve_target(input, catalog)?;

    let name = match resolved.catalog_name.filter(|key| parse_target_name(key).is_ok()) {
        Some(catalog_name) => {
            let question = format!("Enter target name (blank for {})", catalog_name);
            input.ask_parsed(&question, |answer| {
                if answer.trim().is_empty() {
                    Ok(catalog_name.clone())
                } else {
                    parse_target_name(answer)
                }
            })?
        }
        None => input.ask_parsed("Enter target name", parse_target_name)?,
    };

    let capture_hours = input.ask_parsed("Enter number of hours to capture data", parse_hours)?;

    Ok(Target {
        name,
        coordinates: resolved.coordinates,
        filter,
        capture_hours,
    })
}

/// Run a whole interactive session and return the closed script
pub fn run_session<I: InputProvider>(
    input: &mut I,
    config: &GeneratorConfig,
    catalog: Option<&dyn Catalog>,
) -> SessionResult<SessionOutcome> {
    let state = collect_settings(input, config)?;
    let session_filter = if state.profile.filter_per_target {
        None
    } else {
        Some(choose_filter(input, &state.profile)?)
    };

    let mut driver = SessionDriver::start(config, state);

    loop {
        let question = if driver.targets().is_empty() {
            "Add a target? (y/n)"
        } else {
            "Enter additional target? (y/n)"
        };
        if !input.ask_yes_no(question)? {
            break;
        }

        let filter = match session_filter {
            Some(filter) => filter,
            None => choose_filter(input, &driver.state().profile)?,
        };
        let target = collect_target(input, catalog, filter)?;
        let summary = driver.add_target(&target)?;
        input.notify(&format!(
            "{}: {} {} frame(s) in {} block(s)",
            summary.name,
            summary.block.total_frames,
            summary.filter.label(),
            summary.block.blocks.len()
        ));
    }

    if driver.targets().is_empty() {
        tracing::warn!("Session has no targets; the script only unparks and parks");
    }

    let targets = driver.targets().to_vec();
    Ok(SessionOutcome {
        sequence: driver.finish(),
        targets,
    })
}

/// Run a session and write its script to `sink`; nothing is written on error
pub fn generate<I, S>(
    input: &mut I,
    config: &GeneratorConfig,
    catalog: Option<&dyn Catalog>,
    sink: &mut S,
) -> SessionResult<SessionOutcome>
where
    I: InputProvider,
    S: SequenceSink + ?Sized,
{
    let outcome = run_session(input, config, catalog)?;
    sink.write(&outcome.sequence)?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinates::Coordinates;
    use crate::input::ScriptedInput;
    use crate::profiles::{builtin_profiles, FilterKind};

    fn profile(prefix: &str) -> EquipmentProfile {
        builtin_profiles()
            .into_iter()
            .find(|p| p.name.starts_with(prefix))
            .unwrap()
    }

    fn rendered(start_time: Option<NaiveTime>, cooler: Cooler, prefix: &str) -> String {
        let config = GeneratorConfig::default();
        let state = SessionState {
            cooler,
            profile: profile(prefix),
            start_time,
        };
        SessionDriver::start(&config, state).finish().render()
    }

    fn wait_line(hour: u32, minute: u32) -> String {
        Directive::WaitUntilLocalTime(NaiveTime::from_hms_opt(hour, minute, 0).unwrap()).to_string()
    }

    #[test]
    fn test_start_time_uses_twelve_hour_clock() {
        assert_eq!(wait_line(0, 15), "WAIT UNTIL LOCALTIME \"12:15 AM\"");
        assert_eq!(wait_line(12, 0), "WAIT UNTIL LOCALTIME \"12:00 PM\"");
        assert_eq!(wait_line(13, 5), "WAIT UNTIL LOCALTIME \"1:05 PM\"");
        assert_eq!(wait_line(9, 7), "WAIT UNTIL LOCALTIME \"9:07 AM\"");
    }

    #[test]
    fn test_empty_session_preamble_and_shutdown() {
        let text = rendered(None, Cooler::Disabled, "C6");
        assert_eq!(
            text,
            "SEQUENCE\n    DELAY 1\n    MOUNT UNPARK\n    MOUNT UNPARK\n    DELAY 1\n    STILL MODE\n    MOUNT PARK\nEND SEQUENCE\n"
        );
    }

    #[test]
    fn test_wait_precedes_unpark() {
        let time = NaiveTime::from_hms_opt(21, 30, 0).unwrap();
        let text = rendered(Some(time), Cooler::Target(-10), "Orion");
        assert!(text.starts_with("SEQUENCE\n    WAIT UNTIL LOCALTIME \"9:30 PM\"\n    DELAY 1\n    MOUNT UNPARK\n"));
        assert!(text.ends_with("    MOUNT PARK\n    SET COOLER OFF\nEND SEQUENCE\n"));
    }

    #[test]
    fn test_wheel_rig_homes_wheel_at_shutdown() {
        let text = rendered(None, Cooler::Disabled, "Carbonstar");
        assert!(text.ends_with("    MOUNT PARK\n    WHEEL MOVE TO 1\nEND SEQUENCE\n"));
    }

    #[test]
    fn test_cooler_sentinel() {
        assert_eq!(Cooler::from_setting(100, 100), Cooler::Disabled);
        assert_eq!(Cooler::from_setting(-10, 100), Cooler::Target(-10));
        assert_eq!(Cooler::from_setting(0, 100), Cooler::Target(0));
    }

    #[test]
    fn test_driver_phases() {
        let config = GeneratorConfig::default();
        let state = SessionState {
            cooler: Cooler::Disabled,
            profile: profile("C6"),
            start_time: None,
        };
        let mut driver = SessionDriver::start(&config, state);
        assert_eq!(driver.phase(), SessionPhase::Unparked);

        let target = Target {
            name: "M81".to_string(),
            coordinates: Coordinates::from_components(["9", "55", "33", "69", "3", "55"]).unwrap(),
            filter: FilterChoice::Single(FilterKind::UvIr),
            capture_hours: 1.0,
        };
        assert_eq!(driver.add_target(&target).unwrap().block.total_frames, 102);
        assert_eq!(driver.phase(), SessionPhase::PerTargetLoop);
        assert_eq!(driver.targets().len(), 1);
    }

    #[test]
    fn test_start_time_prompt_reprompts_out_of_range() {
        let mut input = ScriptedInput::new(["y", "25", "22", "75", "5"]);
        let time = ask_start_time(&mut input).unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(22, 5, 0));
        assert_eq!(input.notices.len(), 2);
    }

    #[test]
    fn test_collect_settings_with_menu() {
        let config = GeneratorConfig::default();
        let mut input = ScriptedInput::new(["n", "-5", "2"]);
        let state = collect_settings(&mut input, &config).unwrap();
        assert_eq!(state.cooler, Cooler::Target(-5));
        assert_eq!(state.profile.name, "Towa 339");
        assert_eq!(state.start_time, None);
        assert!(input.questions[1].contains("100 to disable"));
    }

    #[test]
    fn test_catalog_name_is_default_target_name() {
        struct OneEntry;
        impl Catalog for OneEntry {
            fn lookup(&self, key: &str) -> Result<Coordinates, crate::error::LookupMiss> {
                if key == "M42" {
                    Ok(Coordinates::from_components(["5", "35", "17", "-5", "23", "28"]).unwrap())
                } else {
                    Err(crate::error::LookupMiss::NotFound(key.to_string()))
                }
            }
            fn names(&self) -> Result<Vec<String>, crate::error::LookupMiss> {
                Ok(vec!["M42".to_string()])
            }
        }

        let mut input = ScriptedInput::new(["y", "M42", "", "1.5"]);
        let target = collect_target(&mut input, Some(&OneEntry), FilterChoice::Single(FilterKind::LPro)).unwrap();
        assert_eq!(target.name, "M42");
        assert_eq!(target.coordinates.to_string(), "5 35 17, -5 23 28");
        assert_eq!(target.capture_hours, 1.5);
    }

    #[test]
    fn test_capture_hours_are_bounded() {
        let mut input = ScriptedInput::new(["1", "2", "3", "4", "5", "6", "M31", "1e12", "24.5", "24"]);
        let target = collect_target(&mut input, None, FilterChoice::Single(FilterKind::UvIr)).unwrap();
        assert_eq!(target.capture_hours, 24.0);
        assert_eq!(input.notices.len(), 2);
        assert!(input.notices[0].contains("at most 24 hours"));
    }

    #[test]
    fn test_target_name_rejects_quotes_and_control_characters() {
        let mut input = ScriptedInput::new([
            "1", "2", "3", "4", "5", "6", "Bode's \"Galaxy\"", "M81\tcore", "Bode's Galaxy", "1",
        ]);
        let target = collect_target(&mut input, None, FilterChoice::Single(FilterKind::UvIr)).unwrap();
        assert_eq!(target.name, "Bode's Galaxy");
        assert_eq!(input.notices.len(), 2);
    }

    #[test]
    fn test_quoted_catalog_key_is_not_offered_as_name() {
        struct QuotedKey;
        impl Catalog for QuotedKey {
            fn lookup(&self, _key: &str) -> Result<Coordinates, crate::error::LookupMiss> {
                Ok(Coordinates::from_components(["0", "42", "44", "41", "16", "9"]).unwrap())
            }
            fn names(&self) -> Result<Vec<String>, crate::error::LookupMiss> {
                Ok(Vec::new())
            }
        }

        let mut input = ScriptedInput::new(["y", "\"M31\"", "", "M31", "2"]);
        let target = collect_target(&mut input, Some(&QuotedKey), FilterChoice::Single(FilterKind::UvIr)).unwrap();
        assert_eq!(target.name, "M31");
        assert!(input.questions.iter().any(|q| q == "Enter target name"));
        assert_eq!(input.notices.len(), 1);
    }

    #[test]
    fn test_capture_hours_must_be_positive() {
        let mut input = ScriptedInput::new(["1", "2", "3", "4", "5", "6", "NGC 7000", "0", "-1", "abc", "2"]);
        let target = collect_target(&mut input, None, FilterChoice::Single(FilterKind::Ha)).unwrap();
        assert_eq!(target.name, "NGC 7000");
        assert_eq!(target.capture_hours, 2.0);
        assert_eq!(input.notices.len(), 3);
    }
}
