/// D-weighting amplitude response at `freq` Hz (IEC 537).
///
/// Unity gain at 1 kHz, roughly +11 dB around 3 kHz, falling off towards
/// both ends of the audible range. Returns 0 at DC.
pub fn d_weighting(freq: f32) -> f32 {
    let f2 = freq * freq;
    let hf = ((1037918.48 - f2) * (1037918.48 - f2) + 1080768.16 * f2)
        / ((9837328.0 - f2) * (9837328.0 - f2) + 11723776.0 * f2);
    (freq / 6.8966888496476e-5) * (hf / ((f2 + 79919.29) * (f2 + 1345600.0))).sqrt()
}
