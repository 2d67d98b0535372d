use crate::core::{ChannelId, ChannelSamples, ConversionConfig, Frame, RawSample, CHANNELS, FRAME_SIZE};

/// Converter reference voltage.
pub const ADC_FULL_SCALE_VOLTS: f64 = 3.3;

/// Largest code of the 12-bit converter.
pub const ADC_MAX_CODE: RawSample = 4095;

pub const VOLTS_PER_CODE: f64 = ADC_FULL_SCALE_VOLTS / ADC_MAX_CODE as f64;

pub fn raw_to_volts(code: RawSample) -> f64 {
    code as f64 * VOLTS_PER_CODE
}

/// Nearest code for an input voltage, saturating at the rails.
pub fn volts_to_raw(volts: f64) -> RawSample {
    (volts / VOLTS_PER_CODE)
        .round()
        .clamp(0.0, ADC_MAX_CODE as f64) as RawSample
}

/// De-interleave one frame into channel-major physical values.
///
/// Channels 0-2 use the voltage offset/scaling, 3-5 the current pair:
/// `physical = (raw_to_volts(raw) - offset) * scaling`.
pub fn convert_frame(frame: &Frame, config: &ConversionConfig, out: &mut ChannelSamples) {
    let raw = frame.as_slice();

    for (channel, channel_out) in ChannelId::ALL.into_iter().zip(out.iter_mut()) {
        let ch = channel.index();
        let (offset, scaling) = if channel.is_voltage() {
            (config.voltage_offset, config.voltage_scaling)
        } else {
            (config.current_offset, config.current_scaling)
        };

        for (n, value) in channel_out.iter_mut().enumerate().take(FRAME_SIZE) {
            let code = raw[n * CHANNELS + ch];
            *value = (raw_to_volts(code) - offset) * scaling;
        }
    }
}
