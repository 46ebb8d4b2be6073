// Newline convention handling: fixed or auto-detected-then-locked.

/// The three newline conventions the scanner understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Newline {
    Lf,
    Cr,
    CrLf,
}

impl Newline {
    #[inline]
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Newline::Lf => b"\n",
            Newline::Cr => b"\r",
            Newline::CrLf => b"\r\n",
        }
    }

    #[inline]
    pub fn len(self) -> usize {
        self.as_bytes().len()
    }
}

/// Newline configuration: either locked to a fixed convention up front, or
/// pending auto-detection on first encounter (then locked for the rest of
/// the parse).
#[derive(Debug, Clone, Copy)]
pub enum NewlineConfig {
    Fixed(Newline),
    Auto(Option<Newline>),
}

impl NewlineConfig {
    pub fn fixed(newline: Newline) -> Self {
        NewlineConfig::Fixed(newline)
    }

    pub fn auto() -> Self {
        NewlineConfig::Auto(None)
    }

    /// The currently-locked newline, if any.
    #[inline]
    pub fn locked(&self) -> Option<Newline> {
        match self {
            NewlineConfig::Fixed(nl) => Some(*nl),
            NewlineConfig::Auto(nl) => *nl,
        }
    }

    /// Lock an auto-detecting config to `newline`. No-op for `Fixed`.
    #[inline]
    pub fn lock(&mut self, newline: Newline) {
        if let NewlineConfig::Auto(slot) = self {
            if slot.is_none() {
                *slot = Some(newline);
            }
        }
    }
}

/// Detect the newline convention starting at `input[pos]`, which must be `\r`
/// or `\n`. `\r\n` if the next byte is `\n`; otherwise bare `\r` or bare `\n`.
#[inline]
pub fn detect_newline_at(input: &[u8], pos: usize) -> Newline {
    match input[pos] {
        b'\r' => {
            if input.get(pos + 1) == Some(&b'\n') {
                Newline::CrLf
            } else {
                Newline::Cr
            }
        }
        b'\n' => Newline::Lf,
        other => unreachable!("detect_newline_at called on non-newline byte {other:#x}"),
    }
}

/// Does a newline (of `newline`'s convention) start at `input[pos]`? Returns
/// its length if so.
#[inline]
pub fn match_newline(input: &[u8], pos: usize, newline: Newline) -> Option<usize> {
    let bytes = newline.as_bytes();
    if input[pos..].starts_with(bytes) {
        Some(bytes.len())
    } else {
        None
    }
}
