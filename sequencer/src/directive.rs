//! SharpCap sequencer directives and the instruction sequence they are collected in

use crate::coordinates::Coordinates;
use chrono::NaiveTime;
use std::fmt;

/// Indentation emitted per nesting level
pub const INDENT: &str = "    ";

/// Output format selected before every target
pub const FITS_OUTPUT_FORMAT: &str = "FITS files (*.fits)";

/// A single line of a SharpCap sequence
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Sequence,
    EndSequence,
    WaitUntilLocalTime(NaiveTime),
    Delay(u32),
    StillMode,
    CoolDown {
        temperature: i32,
        rate: u32,
        tolerance: u32,
    },
    SetCoolerOff,
    SetColourSpace(String),
    SetOutputFormat(String),
    LoadProfile(String),
    WheelMoveTo(u8),
    MountConnect,
    MountUnpark,
    MountPark,
    MountGoto(Coordinates),
    MountSolveAndSync,
    TargetName(String),
    SetExposure(u32),
    SetGain(u32),
    PreserveCameraSettings,
    EndPreserve,
    FrameTypeLight,
    GuidingConnect,
    GuidingStart,
    GuidingStop,
    GuidingDisconnect,
    GuidingDitherEvery(u32),
    GuidingDitherStop,
    Capture {
        frames: u32,
        require_guiding: bool,
    },
    /// Empty separator line between target blocks
    Blank,
}

fn python_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Sequence => write!(f, "SEQUENCE"),
            Directive::EndSequence => write!(f, "END SEQUENCE"),
            Directive::WaitUntilLocalTime(time) => {
                write!(f, "WAIT UNTIL LOCALTIME \"{}\"", time.format("%-I:%M %p"))
            }
            Directive::Delay(secs) => write!(f, "DELAY {}", secs),
            Directive::StillMode => write!(f, "STILL MODE"),
            Directive::CoolDown { temperature, rate, tolerance } => write!(
                f,
                "COOL DOWN TO {} RATE {} TOLERANCE {}",
                temperature, rate, tolerance
            ),
            Directive::SetCoolerOff => write!(f, "SET COOLER OFF"),
            Directive::SetColourSpace(space) => write!(f, "SET COLOUR SPACE TO {}", space),
            Directive::SetOutputFormat(format) => write!(f, "SET OUTPUT FORMAT TO \"{}\"", format),
            Directive::LoadProfile(name) => write!(f, "LOAD PROFILE \"{}\"", name),
            Directive::WheelMoveTo(position) => write!(f, "WHEEL MOVE TO {}", position),
            Directive::MountConnect => write!(f, "MOUNT CONNECT"),
            Directive::MountUnpark => write!(f, "MOUNT UNPARK"),
            Directive::MountPark => write!(f, "MOUNT PARK"),
            Directive::MountGoto(coords) => write!(f, "MOUNT GOTO \"{}\"", coords),
            Directive::MountSolveAndSync => write!(f, "MOUNT SOLVEANDSYNC"),
            Directive::TargetName(name) => write!(f, "TARGETNAME \"{}\"", name),
            Directive::SetExposure(secs) => write!(f, "SET EXPOSURE TO {}", secs),
            Directive::SetGain(gain) => write!(f, "SET GAIN TO {}", gain),
            Directive::PreserveCameraSettings => write!(f, "PRESERVE CAMERA SETTINGS"),
            Directive::EndPreserve => write!(f, "END PRESERVE"),
            Directive::FrameTypeLight => write!(f, "FRAMETYPE Light"),
            Directive::GuidingConnect => write!(f, "GUIDING CONNECT ABORT False"),
            Directive::GuidingStart => write!(f, "GUIDING START"),
            Directive::GuidingStop => write!(f, "GUIDING STOP"),
            Directive::GuidingDisconnect => write!(f, "GUIDING DISCONNECT"),
            Directive::GuidingDitherEvery(frames) => write!(f, "GUIDING DITHER EVERY {} FRAMES", frames),
            Directive::GuidingDitherStop => write!(f, "GUIDING DITHER EVERY STOP"),
            Directive::Capture { frames, require_guiding } => write!(
                f,
                "CAPTURE {} FRAMES REQUIREGUIDING {}",
                frames,
                python_bool(*require_guiding)
            ),
            Directive::Blank => Ok(()),
        }
    }
}

/// A directive together with its nesting depth
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub depth: usize,
    pub directive: Directive,
}

impl fmt::Display for ScriptLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.directive == Directive::Blank {
            return Ok(());
        }
        for _ in 0..self.depth {
            f.write_str(INDENT)?;
        }
        write!(f, "{}", self.directive)
    }
}

/// Append-only sequence under construction.
///
/// Starts with `SEQUENCE`; [`InstructionSequence::finish`] appends
/// `END SEQUENCE` and consumes the builder, so a sequence is closed once.
#[derive(Debug)]
pub struct InstructionSequence {
    lines: Vec<ScriptLine>,
    depth: usize,
}

impl InstructionSequence {
    pub fn begin() -> Self {
        Self {
            lines: vec![ScriptLine {
                depth: 0,
                directive: Directive::Sequence,
            }],
            depth: 1,
        }
    }

    pub fn push(&mut self, directive: Directive) {
        self.lines.push(ScriptLine {
            depth: self.depth,
            directive,
        });
    }

    /// Emit `body` inside a `PRESERVE CAMERA SETTINGS` / `END PRESERVE` scope
    pub fn preserve_camera_settings<F>(&mut self, body: F)
    where
        F: FnOnce(&mut InstructionSequence),
    {
        self.push(Directive::PreserveCameraSettings);
        self.depth += 1;
        body(self);
        self.depth -= 1;
        self.push(Directive::EndPreserve);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[ScriptLine] {
        &self.lines
    }

    pub fn finish(mut self) -> FinishedSequence {
        self.lines.push(ScriptLine {
            depth: 0,
            directive: Directive::EndSequence,
        });
        FinishedSequence { lines: self.lines }
    }
}

/// A closed sequence, ready to hand to a sink
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedSequence {
    lines: Vec<ScriptLine>,
}

impl FinishedSequence {
    pub fn lines(&self) -> &[ScriptLine] {
        &self.lines
    }

    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.lines.iter().map(|l| &l.directive)
    }

    /// Text of the `.scs` file
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.to_string());
            out.push('\n');
        }
        out
    }
}
