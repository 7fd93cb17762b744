//! Machine profiles: factory defaults of the `$` parameters and board wiring
//!
//! Exactly one profile is selected at build time through a cargo feature;
//! [`SELECTED`] is that profile. Switching machines is a rebuild.

use crate::ports::PortMap;
use crate::types::AxisMask;

pub mod bobs_cnc_e4;
pub mod pocket_nc_fr4;
pub mod zen_toolworks_7x7;

#[cfg(not(any(
    feature = "machine-bobs-cnc-e4",
    feature = "machine-zen-toolworks-7x7",
    feature = "machine-pocket-nc-fr4"
)))]
compile_error!(
    "no machine profile selected: enable one of `machine-bobs-cnc-e4`, `machine-zen-toolworks-7x7`, `machine-pocket-nc-fr4`"
);

#[cfg(any(
    all(feature = "machine-bobs-cnc-e4", feature = "machine-zen-toolworks-7x7"),
    all(feature = "machine-bobs-cnc-e4", feature = "machine-pocket-nc-fr4"),
    all(feature = "machine-zen-toolworks-7x7", feature = "machine-pocket-nc-fr4"),
))]
compile_error!("more than one machine profile selected; disable default features to pick another machine");

/// Profile chosen by the `machine-*` feature
#[cfg(feature = "machine-bobs-cnc-e4")]
pub const SELECTED: MachineProfile = bobs_cnc_e4::PROFILE;

#[cfg(feature = "machine-zen-toolworks-7x7")]
pub const SELECTED: MachineProfile = zen_toolworks_7x7::PROFILE;

#[cfg(feature = "machine-pocket-nc-fr4")]
pub const SELECTED: MachineProfile = pocket_nc_fr4::PROFILE;

/// Every profile compiled into this crate, for listing and tests
pub const ALL: [&MachineProfile; 3] = [&bobs_cnc_e4::PROFILE, &zen_toolworks_7x7::PROFILE, &pocket_nc_fr4::PROFILE];

/// Factory settings of one machine.
///
/// Per-axis arrays are in X, Y, Z order. Rates are mm/min, accelerations
/// mm/min², lengths mm.
#[derive(Copy, Clone, Debug)]
pub struct MachineProfile {
    pub name: &'static str,
    pub board: PortMap,
    pub steps_per_mm: [f32; 3],
    pub max_rate: [f32; 3],
    pub acceleration: [f32; 3],
    /// Positive travel lengths
    pub max_travel: [f32; 3],
    pub spindle_rpm_max: f32,
    pub spindle_rpm_min: f32,
    pub step_pulse_us: u8,
    pub step_invert_mask: AxisMask,
    pub dir_invert_mask: AxisMask,
    /// 0-254 ms; 255 keeps the steppers enabled
    pub stepper_idle_lock_ms: u8,
    pub status_report_mask: u8,
    pub junction_deviation: f32,
    pub arc_tolerance: f32,
    pub report_inches: bool,
    pub invert_st_enable: bool,
    pub invert_limit_pins: bool,
    pub soft_limit_enable: bool,
    pub hard_limit_enable: bool,
    pub invert_probe_pin: bool,
    pub laser_mode: bool,
    pub homing_enable: bool,
    pub homing_dir_mask: AxisMask,
    pub homing_feed_rate: f32,
    pub homing_seek_rate: f32,
    pub homing_debounce_delay_ms: u16,
    pub homing_pulloff: f32,
}

impl MachineProfile {
    /// Idle lock value that disables the idle timeout
    pub const IDLE_LOCK_ALWAYS: u8 = 255;
}
