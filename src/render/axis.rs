//! Frequency axis printed above the spectrum.

/// Two axis lines for a spectrum of `width` glyphs framed by borders.
///
/// `labels` follow the layout of
/// [`SpectrumAnalyzer::labels`](crate::analysis::SpectrumAnalyzer::labels):
/// the first two are the left and right endpoints, the rest are placed in
/// order wherever they fit with one free column on either side.
pub fn render(width: usize, labels: &[(String, f32)]) -> String {
    let len = width + 2;
    let mut text = vec![' '; len];
    let mut ticks = vec!['─'; len];
    ticks[0] = '├';
    ticks[len - 1] = '┤';

    if let Some((min_label, _)) = labels.first() {
        place(&mut text, 0, min_label);
    }
    if let Some((max_label, _)) = labels.get(1) {
        let label_len = max_label.chars().count().min(len);
        place(&mut text, len - label_len, max_label);
    }

    for (label, position) in labels.iter().skip(2) {
        let label_len = label.chars().count() as isize;
        let center = (position * len as f32 + 0.5) as isize;
        let begin = center - label_len / 2;
        let end = begin + label_len;

        if begin < 1 || end + 1 >= len as isize - 1 {
            continue;
        }

        let free = text[(begin - 1) as usize..(end + 1) as usize]
            .iter()
            .all(|&c| c == ' ');
        if free {
            place(&mut text, begin as usize, label);
            ticks[center as usize] = '┴';
        }
    }

    let text: String = text.into_iter().collect();
    let ticks: String = ticks.into_iter().collect();
    format!("{text} [Hz]\n{ticks}\n")
}

fn place(row: &mut [char], at: usize, label: &str) {
    for (slot, c) in row[at..].iter_mut().zip(label.chars()) {
        *slot = c;
    }
}
