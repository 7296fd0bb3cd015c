use anyhow::{bail, Context, Result};

/// Parse a text trace of raw switch samples, one entry per timer tick.
///
/// Entries are separated by whitespace or commas. Each entry is a sample
/// value (`0x7E` hex or `126` decimal), optionally repeated with `*count`.
/// `#` starts a comment running to the end of the line.
///
/// ```text
/// # press switch 0 for 200 ticks
/// 0x7F*10 0x7E*200
/// 0x7F, 0x7F, 0x7F
/// ```
pub fn parse_trace(input: &str) -> Result<Vec<u8>> {
    let mut samples = Vec::new();

    for (line_num, line) in input.lines().enumerate() {
        let line = match line.split_once('#') {
            Some((data, _comment)) => data,
            None => line,
        };

        for token in line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
        {
            let (value, count) = match token.split_once('*') {
                Some((value, count)) => {
                    let count: usize = count
                        .parse()
                        .with_context(|| format!("line {}: bad repeat count {:?}", line_num + 1, count))?;
                    if count == 0 {
                        bail!("line {}: repeat count must be at least 1", line_num + 1);
                    }
                    (value, count)
                }
                None => (token, 1),
            };

            let sample = parse_sample(value)
                .with_context(|| format!("line {}: bad sample {:?}", line_num + 1, value))?;
            samples.extend(std::iter::repeat(sample).take(count));
        }
    }

    Ok(samples)
}

fn parse_sample(value: &str) -> Result<u8> {
    Ok(u8::try_from(parse_number(value)?)?)
}

/// A 16-bit number, `0x` hex or decimal.
pub fn parse_number(value: &str) -> Result<u16> {
    let number = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u16::from_str_radix(hex, 16)?,
        None => value.parse()?,
    };
    Ok(number)
}
