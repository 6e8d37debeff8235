/// Block assembly: joining enumerated sections under the block header.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Flatten `sections` into one block of text headed by `header`.
///
/// With probability `shuffle_probability` the section order is shuffled
/// first; otherwise sections keep the order given. Values above 1 count as
/// 1; negative or NaN values count as 0. Every line, header included, ends
/// with a newline.
pub fn assemble_block(
    header: &str,
    sections: &[&[String]],
    shuffle_probability: f64,
    rng: &mut StdRng,
) -> String {
    let mut order = sections.to_vec();
    let p = if shuffle_probability.is_nan() {
        0.0
    } else {
        shuffle_probability.clamp(0.0, 1.0)
    };
    if rng.gen_bool(p) {
        order.shuffle(rng);
    }

    let body: usize = order.iter().flat_map(|s| s.iter()).map(|l| l.len() + 1).sum();
    let mut out = String::with_capacity(header.len() + 1 + body);
    out.push_str(header);
    out.push('\n');
    for line in order.iter().flat_map(|s| s.iter()) {
        out.push_str(line);
        out.push('\n');
    }
    out
}
