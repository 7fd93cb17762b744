//! Zen Toolworks 7x7 mill

use super::MachineProfile;
use crate::board::ARDUINO_UNO;
use crate::types::{Axis, AxisMask};

const STEPS_PER_REV: f32 = 200.0;
const MICROSTEPS: f32 = 8.0;
const MM_PER_REV: f32 = 8.0;
const STEPS_PER_MM: f32 = STEPS_PER_REV * MICROSTEPS / MM_PER_REV;

pub const PROFILE: MachineProfile = MachineProfile {
    name: "zen-toolworks-7x7",
    board: ARDUINO_UNO,
    steps_per_mm: [STEPS_PER_MM; 3],
    max_rate: [6000.0; 3],
    acceleration: [600.0 * 60.0 * 60.0; 3],
    max_travel: [190.0, 180.0, 150.0],
    spindle_rpm_max: 10000.0,
    spindle_rpm_min: 0.0,
    step_pulse_us: 10,
    step_invert_mask: AxisMask::NONE,
    dir_invert_mask: AxisMask::of(&[Axis::Y]),
    stepper_idle_lock_ms: 25,
    status_report_mask: 1,
    junction_deviation: 0.02,
    arc_tolerance: 0.002,
    report_inches: false,
    invert_st_enable: false,
    invert_limit_pins: false,
    soft_limit_enable: false,
    hard_limit_enable: false,
    invert_probe_pin: false,
    laser_mode: false,
    homing_enable: false,
    homing_dir_mask: AxisMask::NONE,
    homing_feed_rate: 25.0,
    homing_seek_rate: 250.0,
    homing_debounce_delay_ms: 250,
    homing_pulloff: 1.0,
};
