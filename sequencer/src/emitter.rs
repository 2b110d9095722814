//! Target block emission
//!
//! Turns one resolved target into the directives that image it: setup,
//! slew, platesolve, guiding, dithered capture. All table lookups happen
//! before anything is appended, so a configuration error never leaves half
//! a block in the sequence.

use crate::config::GeneratorConfig;
use crate::coordinates::Coordinates;
use crate::directive::{Directive, InstructionSequence, FITS_OUTPUT_FORMAT};
use crate::error::ConfigurationError;
use crate::frames::{frame_count, hours_after_allowance, split_into_blocks, MAX_CAPTURE_HOURS};
use crate::profiles::{CaptureParameters, EquipmentProfile, FilterChoice, FilterKind, PlatesolveStrategy};
use crate::session::{Cooler, SessionState};

/// One target as entered by the operator
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub name: String,
    pub coordinates: Coordinates,
    pub filter: FilterChoice,
    /// Requested imaging time in hours
    pub capture_hours: f64,
}

/// Frame accounting for an emitted block
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSummary {
    /// Frames for the whole target before splitting across channels
    pub total_frames: u32,
    /// Frames captured per channel
    pub frames_per_channel: u32,
    /// Capture counts per re-anchored pass (one entry when no flexure cap applies)
    pub blocks: Vec<u32>,
    pub channels: usize,
}

/// A filter captured within the block
#[derive(Debug, Clone)]
struct Channel {
    target_name: String,
    wheel_position: Option<u8>,
}

/// Everything looked up before emission
#[derive(Debug, Clone)]
struct BlockPlan {
    params: CaptureParameters,
    sharpcap_profile: Option<String>,
    /// Wheel slot for solving, when the rig has a wheel
    solve_position: Option<u8>,
    /// Wheel slot to return to after solving when a single filter is imaged
    imaging_position: Option<u8>,
    channels: Vec<Channel>,
    compound: bool,
    summary: BlockSummary,
}

/// Emits target blocks for one session
pub struct TargetBlockEmitter<'a> {
    config: &'a GeneratorConfig,
    state: &'a SessionState,
}

impl<'a> TargetBlockEmitter<'a> {
    pub fn new(config: &'a GeneratorConfig, state: &'a SessionState) -> Self {
        Self { config, state }
    }

    fn profile(&self) -> &EquipmentProfile {
        &self.state.profile
    }

    /// Name written by `TARGETNAME`; wheel rigs get a filter suffix so
    /// successive filters on one object land in distinct folders
    pub fn target_name(&self, name: &str, filter: FilterKind) -> String {
        if self.profile().uses_filter_wheel() {
            format!("{}_{}", name, filter.code())
        } else {
            name.to_string()
        }
    }

    fn plan(&self, target: &Target, first_target: bool) -> Result<BlockPlan, ConfigurationError> {
        let profile = self.profile();
        let primary = target.filter.primary();
        let entry = profile.entry(primary)?;
        let compound = matches!(target.filter, FilterChoice::RgbCompound);

        let channels = target
            .filter
            .channels()
            .into_iter()
            .map(|filter| -> Result<Channel, ConfigurationError> {
                let wheel_position = match profile.filter_wheel() {
                    Some(_) => Some(profile.wheel_position(filter)?),
                    None => None,
                };
                Ok(Channel {
                    target_name: self.target_name(&target.name, filter),
                    wheel_position,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if !target.capture_hours.is_finite() || target.capture_hours > MAX_CAPTURE_HOURS {
            return Err(ConfigurationError::InvalidValue {
                field: format!("{}.capture_hours", target.name),
                reason: format!("must be at most {} hours, got {}", MAX_CAPTURE_HOURS, target.capture_hours),
            });
        }

        let hours = match profile.first_target_setup_minutes {
            Some(minutes) if first_target => hours_after_allowance(target.capture_hours, minutes),
            _ => target.capture_hours,
        };
        let total_frames = frame_count(hours, entry.params.seconds_per_frame);
        let frames_per_channel = total_frames / channels.len() as u32;
        let blocks = split_into_blocks(frames_per_channel, profile.block_cap(primary));

        if frames_per_channel == 0 {
            tracing::warn!(
                "{} hours on '{}' yields no {} frames",
                target.capture_hours,
                target.name,
                target.filter.label()
            );
        }
        tracing::info!(
            "Target '{}' ({}): {} frames at {} s/frame, blocks {:?}",
            target.name,
            target.filter.label(),
            total_frames,
            entry.params.seconds_per_frame,
            blocks
        );

        Ok(BlockPlan {
            params: entry.params.clone(),
            sharpcap_profile: entry.sharpcap_profile.clone(),
            solve_position: profile.filter_wheel().map(|w| w.solve_position),
            imaging_position: if compound { None } else { channels[0].wheel_position },
            compound,
            summary: BlockSummary {
                total_frames,
                frames_per_channel,
                blocks,
                channels: channels.len(),
            },
            channels,
        })
    }

    /// Append the imaging block for `target` to `seq`
    pub fn emit(
        &self,
        seq: &mut InstructionSequence,
        target: &Target,
        first_target: bool,
    ) -> Result<BlockSummary, ConfigurationError> {
        let plan = self.plan(target, first_target)?;
        let profile = self.profile();
        let timings = &self.config.timings;

        // Setup
        seq.push(Directive::Delay(timings.setup_delay_secs));
        seq.push(Directive::StillMode);
        if let Cooler::Target(temperature) = self.state.cooler {
            seq.push(Directive::CoolDown {
                temperature,
                rate: profile.cooler_rate,
                tolerance: self.config.cooler_tolerance,
            });
        }

        // Image format and equipment
        seq.push(Directive::SetColourSpace(profile.colour_space.clone()));
        seq.push(Directive::SetOutputFormat(FITS_OUTPUT_FORMAT.to_string()));
        if let Some(name) = &plan.sharpcap_profile {
            seq.push(Directive::LoadProfile(name.clone()));
        }
        seq.push(Directive::MountConnect);

        // Slew; the equator-assisted strategy starts from an easier field
        let equator_assisted = profile.platesolve == PlatesolveStrategy::EquatorAssisted;
        let first_position = if equator_assisted {
            target.coordinates.toward_equator(self.config.equator_assist_offset_deg)
        } else {
            target.coordinates
        };
        seq.push(Directive::MountGoto(first_position));
        seq.push(Directive::Delay(profile.slew_settle_secs));

        if !plan.compound {
            seq.push(Directive::TargetName(plan.channels[0].target_name.clone()));
        }
        seq.push(Directive::SetExposure(plan.params.exposure_secs));

        // Platesolve and sync
        self.wheel_move(seq, plan.solve_position);
        if equator_assisted {
            self.solve_and_sync(seq, &plan);
            seq.push(Directive::MountGoto(target.coordinates));
            seq.push(Directive::Delay(profile.slew_settle_secs));
        }
        for _ in 0..profile.platesolve.passes_at_target() {
            self.solve_and_sync(seq, &plan);
        }
        self.wheel_move(seq, plan.imaging_position);

        self.start_guiding(seq);

        for (pass, frames) in plan.summary.blocks.iter().enumerate() {
            if pass > 0 {
                tracing::debug!("Re-anchoring '{}' before capture pass {}", target.name, pass + 1);
                self.reanchor(seq, target, &plan);
            }
            for channel in &plan.channels {
                if plan.compound {
                    self.wheel_move(seq, channel.wheel_position);
                    seq.push(Directive::TargetName(channel.target_name.clone()));
                }
                self.capture(seq, &plan.params, *frames);
            }
        }

        seq.push(Directive::GuidingStop);
        seq.push(Directive::GuidingDisconnect);
        seq.push(Directive::Blank);

        Ok(plan.summary)
    }

    fn wheel_move(&self, seq: &mut InstructionSequence, position: Option<u8>) {
        if let Some(position) = position {
            seq.push(Directive::WheelMoveTo(position));
            seq.push(Directive::Delay(self.config.timings.wheel_settle_secs));
        }
    }

    fn solve_and_sync(&self, seq: &mut InstructionSequence, plan: &BlockPlan) {
        let exposure = plan.params.platesolve_exposure_secs;
        let gain = self.config.platesolve_gain;
        seq.preserve_camera_settings(|block| {
            block.push(Directive::SetExposure(exposure));
            block.push(Directive::SetGain(gain));
            block.push(Directive::MountSolveAndSync);
        });
        seq.push(Directive::Delay(self.config.timings.post_solve_delay_secs));
    }

    fn start_guiding(&self, seq: &mut InstructionSequence) {
        let timings = &self.config.timings;
        seq.push(Directive::GuidingConnect);
        seq.push(Directive::GuidingStop);
        seq.push(Directive::Delay(timings.guiding_stop_delay_secs));
        seq.push(Directive::GuidingStart);
        seq.push(Directive::Delay(timings.guiding_settle_secs));
    }

    fn capture(&self, seq: &mut InstructionSequence, params: &CaptureParameters, frames: u32) {
        let dither = params.dither_every_frames;
        seq.preserve_camera_settings(|block| {
            block.push(Directive::FrameTypeLight);
            block.push(Directive::GuidingDitherEvery(dither));
            block.push(Directive::Capture {
                frames,
                require_guiding: true,
            });
            block.push(Directive::GuidingDitherStop);
        });
    }

    /// Park, unpark, re-slew and re-solve to undo accumulated flexure
    fn reanchor(&self, seq: &mut InstructionSequence, target: &Target, plan: &BlockPlan) {
        let profile = self.profile();
        let settle = self.config.timings.park_settle_secs;

        seq.push(Directive::GuidingStop);
        seq.push(Directive::MountPark);
        seq.push(Directive::Delay(settle));
        seq.push(Directive::MountUnpark);
        seq.push(Directive::Delay(settle));
        seq.push(Directive::MountGoto(target.coordinates));
        seq.push(Directive::Delay(profile.slew_settle_secs));

        self.wheel_move(seq, plan.solve_position);
        for _ in 0..profile.platesolve.passes_at_target() {
            self.solve_and_sync(seq, plan);
        }
        self.wheel_move(seq, plan.imaging_position);

        self.start_guiding(seq);
    }
}
