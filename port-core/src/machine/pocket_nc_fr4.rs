//! Pocket NC FR4 desktop mill

use super::MachineProfile;
use crate::board::ARDUINO_UNO;
use crate::types::{Axis, AxisMask};

pub const PROFILE: MachineProfile = MachineProfile {
    name: "pocket-nc-fr4",
    board: ARDUINO_UNO,
    steps_per_mm: [800.0; 3],
    max_rate: [300.0; 3],
    acceleration: [30.0 * 60.0 * 60.0; 3],
    max_travel: [225.0, 125.0, 170.0],
    spindle_rpm_max: 7000.0,
    spindle_rpm_min: 0.0,
    step_pulse_us: 10,
    step_invert_mask: AxisMask::NONE,
    dir_invert_mask: AxisMask::of(&[Axis::Y, Axis::Z]),
    stepper_idle_lock_ms: 250,
    // WPos
    status_report_mask: 3,
    junction_deviation: 0.01,
    arc_tolerance: 0.002,
    report_inches: false,
    invert_st_enable: true,
    invert_limit_pins: false,
    soft_limit_enable: false,
    hard_limit_enable: false,
    invert_probe_pin: false,
    laser_mode: false,
    homing_enable: true,
    homing_dir_mask: AxisMask::of(&[Axis::X]),
    homing_feed_rate: 100.0,
    homing_seek_rate: 300.0,
    homing_debounce_delay_ms: 250,
    homing_pulloff: 3.0,
};
