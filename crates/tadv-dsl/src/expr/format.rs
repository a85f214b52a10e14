use tadv_core::Value;

/// Widths and precisions above this are not honoured.
pub const MAX_FIELD: usize = 1024;

/// Field alignment within the padded width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    /// `<`
    Left,
    /// `>`, the default.
    Right,
    /// `^`
    Center,
    /// Padding goes between the sign and the digits.
    AfterSign,
}

/// A numeric format spec: `[[fill]align][sign][0][width][,][.precision][type]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatSpec {
    /// Padding character, a space unless given before the alignment.
    pub fill: char,
    /// Explicit alignment, if any.
    pub align: Option<Align>,
    /// `+`, `-` or a space.
    pub sign: Option<char>,
    /// A leading `0` before the width.
    pub zero_pad: bool,
    /// Minimum field width. Zero means no padding.
    pub width: usize,
    /// `,` thousands separators.
    pub grouping: bool,
    /// Digits after the point, or significant digits for `g`.
    pub precision: Option<usize>,
    /// One of `d f F % e E g`.
    pub kind: Option<char>,
}

fn align_of(c: char) -> Option<Align> {
    match c {
        '<' => Some(Align::Left),
        '>' => Some(Align::Right),
        '^' => Some(Align::Center),
        '=' => Some(Align::AfterSign),
        _ => None,
    }
}

impl FormatSpec {
    /// Parse a spec. Returns `None` unless the whole string is consumed.
    pub fn parse(spec: &str) -> Option<Self> {
        if spec.is_empty() {
            return None;
        }
        let chars: Vec<char> = spec.chars().collect();
        let mut i = 0;
        let mut fill = ' ';
        let mut align = None;

        if chars.len() >= 2
            && let Some(a) = align_of(chars[1])
        {
            fill = chars[0];
            align = Some(a);
            i = 2;
        } else if let Some(a) = align_of(chars[0]) {
            align = Some(a);
            i = 1;
        }

        let mut sign = None;
        if let Some(&c) = chars.get(i)
            && matches!(c, '+' | '-' | ' ')
        {
            sign = Some(c);
            i += 1;
        }

        let mut zero_pad = false;
        if chars.get(i) == Some(&'0') {
            zero_pad = true;
            i += 1;
        }

        let digits = |i: &mut usize| -> Option<usize> {
            let start = *i;
            while chars.get(*i).is_some_and(char::is_ascii_digit) {
                *i += 1;
            }
            (*i > start).then(|| chars[start..*i].iter().collect::<String>().parse().ok())?
        };

        let width = digits(&mut i).unwrap_or(0);

        let mut grouping = false;
        if chars.get(i) == Some(&',') {
            grouping = true;
            i += 1;
        }

        let mut precision = None;
        if chars.get(i) == Some(&'.') {
            i += 1;
            precision = Some(digits(&mut i)?);
        }

        let mut kind = None;
        if let Some(&c) = chars.get(i)
            && matches!(c, 'd' | 'f' | 'F' | '%' | 'e' | 'E' | 'g')
        {
            kind = Some(c);
            i += 1;
        }

        (i == chars.len()).then_some(Self {
            fill,
            align,
            sign,
            zero_pad,
            width,
            grouping,
            precision,
            kind,
        })
    }

    /// Format a numeric value. Returns `None` for non-numbers and for
    /// combinations the format cannot express, such as `d` on a float.
    pub fn apply(&self, value: &Value) -> Option<String> {
        if self.width > MAX_FIELD || self.precision.is_some_and(|p| p > MAX_FIELD) {
            return None;
        }
        let (negative, body) = match (value, self.kind) {
            (Value::Integer(n), None | Some('d')) => {
                let digits = n.unsigned_abs().to_string();
                (*n < 0, self.group(&digits))
            }
            (Value::Float(_), Some('d')) => return None,
            (Value::Float(f), None) => match self.precision {
                Some(p) => (f.is_sign_negative(), general(f.abs(), p, false)),
                None => (f.is_sign_negative(), format!("{}", f.abs())),
            },
            (v, Some(kind)) => {
                let x = v.as_f64()?;
                let magnitude = x.abs();
                let body = if !magnitude.is_finite() {
                    non_finite(magnitude, kind.is_ascii_uppercase())
                } else {
                    match kind {
                        'f' | 'F' => self.fixed(magnitude, self.precision.unwrap_or(6)),
                        '%' => format!(
                            "{}%",
                            self.fixed(magnitude * 100.0, self.precision.unwrap_or(6))
                        ),
                        'e' | 'E' => {
                            exponent(magnitude, self.precision.unwrap_or(6), kind == 'E')
                        }
                        _ => general(magnitude, self.precision.unwrap_or(6), false),
                    }
                };
                (x.is_sign_negative() && x != 0.0, body)
            }
            _ => return None,
        };

        let sign = match (negative, self.sign) {
            (true, _) => "-",
            (false, Some('+')) => "+",
            (false, Some(' ')) => " ",
            _ => "",
        };
        Some(self.pad(sign, &body))
    }

    fn fixed(&self, x: f64, precision: usize) -> String {
        let text = format!("{x:.precision$}");
        match text.split_once('.') {
            Some((int, frac)) => format!("{}.{frac}", self.group(int)),
            None => self.group(&text),
        }
    }

    fn group(&self, digits: &str) -> String {
        if !self.grouping {
            return digits.to_string();
        }
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i).is_multiple_of(3) {
                out.push(',');
            }
            out.push(c);
        }
        out
    }

    fn pad(&self, sign: &str, body: &str) -> String {
        let len = sign.chars().count() + body.chars().count();
        let missing = self.width.saturating_sub(len);
        let (fill, align) = match (self.align, self.zero_pad) {
            (None, true) => ('0', Align::AfterSign),
            (Some(a), _) => (self.fill, a),
            (None, false) => (self.fill, Align::Right),
        };
        let fill_n = |n: usize| std::iter::repeat_n(fill, n).collect::<String>();
        match align {
            Align::Left => format!("{sign}{body}{}", fill_n(missing)),
            Align::Right => format!("{}{sign}{body}", fill_n(missing)),
            Align::AfterSign => format!("{sign}{}{body}", fill_n(missing)),
            Align::Center => {
                let left = missing / 2;
                format!("{}{sign}{body}{}", fill_n(left), fill_n(missing - left))
            }
        }
    }
}

fn non_finite(x: f64, upper: bool) -> String {
    let text = if x.is_nan() { "nan" } else { "inf" };
    if upper {
        text.to_uppercase()
    } else {
        text.to_string()
    }
}

/// Scientific notation with a signed, at least two-digit exponent: `1.23e+04`.
fn exponent(x: f64, precision: usize, upper: bool) -> String {
    let text = format!("{x:.precision$e}");
    let (mantissa, exp) = text.split_once('e').unwrap_or((&text, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let e = if upper { 'E' } else { 'e' };
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}{e}{sign}{:02}", exp.unsigned_abs())
}

/// General format: fixed or scientific depending on magnitude, trailing
/// zeros removed.
fn general(x: f64, precision: usize, upper: bool) -> String {
    let p = precision.max(1);
    if x == 0.0 {
        return "0".to_string();
    }
    let sci = format!("{x:.prec$e}", prec = p - 1);
    let exp: i32 = sci
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);

    if exp >= -4 && exp < p as i32 {
        let decimals = (p as i32 - 1 - exp).max(0) as usize;
        strip_zeros(&format!("{x:.decimals$}"))
    } else {
        let text = exponent(x, p - 1, upper);
        match text.split_once(['e', 'E']) {
            Some((mantissa, rest)) => {
                let e = if upper { 'E' } else { 'e' };
                format!("{}{e}{rest}", strip_zeros(mantissa))
            }
            None => text,
        }
    }
}

fn strip_zeros(text: &str) -> String {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text.to_string()
    }
}

/// Split an interpolation body into expression and format spec.
///
/// The split happens at the last `:` outside quotes and brackets, and only
/// when the suffix parses as a spec; otherwise the whole body is the
/// expression.
pub fn split_format(inner: &str) -> (&str, Option<FormatSpec>) {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut last = None;
    let mut escaped = false;

    for (i, c) in inner.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => last = Some(i),
            _ => {}
        }
    }

    if let Some(i) = last
        && let Some(spec) = FormatSpec::parse(inner[i + 1..].trim())
    {
        return (inner[..i].trim(), Some(spec));
    }
    (inner.trim(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(spec: &str, value: impl Into<Value>) -> Option<String> {
        FormatSpec::parse(spec)?.apply(&value.into())
    }

    #[test]
    fn fixed_precision() {
        assert_eq!(fmt(".2f", 3.14159).as_deref(), Some("3.14"));
        assert_eq!(fmt(".1f", 72).as_deref(), Some("72.0"));
        assert_eq!(fmt("f", 1.5).as_deref(), Some("1.500000"));
    }

    #[test]
    fn grouping() {
        assert_eq!(fmt(",d", 1_234_567).as_deref(), Some("1,234,567"));
        assert_eq!(fmt(",", -1000).as_deref(), Some("-1,000"));
        assert_eq!(fmt(",.2f", 12345.678).as_deref(), Some("12,345.68"));
    }

    #[test]
    fn width_and_alignment() {
        assert_eq!(fmt(">6", 42).as_deref(), Some("    42"));
        assert_eq!(fmt("<5d", 7).as_deref(), Some("7    "));
        assert_eq!(fmt("*^7", 42).as_deref(), Some("**42***"));
        assert_eq!(fmt("05.1f", 3.14).as_deref(), Some("003.1"));
        assert_eq!(fmt("05d", -42).as_deref(), Some("-0042"));
    }

    #[test]
    fn signs() {
        assert_eq!(fmt("+d", 5).as_deref(), Some("+5"));
        assert_eq!(fmt(" .1f", 2.0).as_deref(), Some(" 2.0"));
    }

    #[test]
    fn percent_and_exponent() {
        assert_eq!(fmt(".0%", 0.25).as_deref(), Some("25%"));
        assert_eq!(fmt(".2e", 12345.0).as_deref(), Some("1.23e+04"));
        assert_eq!(fmt(".1E", 0.00042).as_deref(), Some("4.2E-04"));
    }

    #[test]
    fn general_format() {
        assert_eq!(fmt("g", 0.5).as_deref(), Some("0.5"));
        assert_eq!(fmt(".3g", 1234.5).as_deref(), Some("1.23e+03"));
        assert_eq!(fmt(".2", 3.14159).as_deref(), Some("3.1"));
    }

    #[test]
    fn unsupported_combinations() {
        assert_eq!(fmt("d", 2.5), None);
        assert_eq!(fmt(".2f", "text"), None);
        assert!(FormatSpec::parse("").is_none());
        assert!(FormatSpec::parse("abc").is_none());
        assert!(FormatSpec::parse(".f").is_none());
    }

    #[test]
    fn oversized_fields_are_not_honoured() {
        assert_eq!(fmt("999999999999", 5), None);
        assert_eq!(fmt(".999999999f", 1.5), None);
        assert_eq!(fmt(">1024", 1).map(|s| s.len()), Some(1024));
    }

    #[test]
    fn split_at_last_top_level_colon() {
        let (expr, spec) = split_format(" player.weight:.1f ");
        assert_eq!(expr, "player.weight");
        assert_eq!(spec.and_then(|s| s.precision), Some(1));

        let (expr, spec) = split_format("var('a:b')");
        assert_eq!(expr, "var('a:b')");
        assert!(spec.is_none());

        let (expr, spec) = split_format("name");
        assert_eq!(expr, "name");
        assert!(spec.is_none());
    }
}
