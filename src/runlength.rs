/// Small ring buffer of consecutive-run lengths, with exact and rounded
/// ratio matchers. The detector feeds pixels through this to spot the
/// 1:1:3:1:1 finder signature and the leading patterns of the 1-D codes.

// ten runs of history plus room for the quiet-zone probe beyond them
pub const MAX_RUNLENGTH: usize = 12;

#[derive(Clone, Debug)]
pub struct RunLength {
    ringbuf: [u32; MAX_RUNLENGTH],
    idx: usize,
    last_value: u32,
}

impl RunLength {
    pub fn new() -> RunLength {
        let mut rl = RunLength { ringbuf: [0; MAX_RUNLENGTH], idx: 0, last_value: u32::max_value() };
        // 0 never matches
        rl.next();
        rl.next();
        rl
    }

    pub fn reset(&mut self) {
        *self = RunLength::new();
    }

    /// run length `back` runs ago; 0 is the run being counted now
    pub fn get(&self, back: usize) -> u32 {
        debug_assert!(back < MAX_RUNLENGTH);
        self.ringbuf[(self.idx + MAX_RUNLENGTH - back) % MAX_RUNLENGTH]
    }

    pub fn latest(&self) -> u32 {
        self.get(0)
    }

    pub fn sum(&self, s: usize, e: usize) -> u32 {
        (s..e).map(|i| self.get(i)).sum()
    }

    pub fn next(&mut self) {
        self.idx = (self.idx + 1) % MAX_RUNLENGTH;
        self.ringbuf[self.idx] = 0;
    }

    pub fn count(&mut self) {
        self.ringbuf[self.idx] += 1;
    }

    /// returns true when the value changed and a new run was started
    pub fn push_value(&mut self, value: u32) -> bool {
        if self.last_value != value {
            self.last_value = value;
            self.next();
            self.count();
            return true;
        }
        self.count();
        false
    }

    /// eg; [1, 2, 0, 2, 1] matches runs 1 2 X 2 1 (0 entries are wildcards)
    pub fn match_exact(&self, pattern: &[u32]) -> bool {
        let n = pattern.len();
        debug_assert!(0 < n && n <= MAX_RUNLENGTH);
        for (i, &want) in pattern.iter().enumerate() {
            if want != 0 && self.get(n - i - 1) != want {
                return false;
            }
        }
        true
    }

    /// eg; [0, 1, 3, 1] matches runs X 2 6 2; each run is compared after
    /// rounding to the nearest multiple of the common module size
    pub fn match_ratio(&self, pattern: &[u32]) -> bool {
        let n = pattern.len();
        debug_assert!(0 < n && n <= MAX_RUNLENGTH);

        let mut total_count = 0;
        let mut total_ratio = 0;
        for (i, &r) in pattern.iter().enumerate() {
            if r == 0 {
                continue;
            }
            total_ratio += r;
            total_count += self.get(n - i - 1);
        }
        if total_ratio == 0 || total_count == 0 {
            return false;
        }

        for (i, &r) in pattern.iter().enumerate() {
            if r == 0 {
                continue;
            }
            let value = self.get(n - i - 1);
            if (value * total_ratio + total_count / 2) / total_count != r {
                return false;
            }
        }
        true
    }
}

//-------------------------------------------------------------------
// TESTS
//-------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;

    fn feed(rl: &mut RunLength, runs: &[(u32, u32)]) {
        for &(v, n) in runs {
            for _ in 0..n {
                rl.push_value(v);
            }
        }
    }

    #[test]
    fn test_push_and_get() {
        let mut rl = RunLength::new();
        feed(&mut rl, &[(1, 3), (0, 2), (1, 5)]);
        assert_eq!(rl.get(0), 5);
        assert_eq!(rl.get(1), 2);
        assert_eq!(rl.get(2), 3);
        assert_eq!(rl.sum(0, 3), 10);
    }

    #[test]
    fn test_finder_ratio_match() {
        let mut rl = RunLength::new();
        // 2:2:6:2:2 scaled finder run, then a trailing quiet run
        feed(&mut rl, &[(0, 4), (1, 2), (0, 2), (1, 6), (0, 2), (1, 2), (0, 3)]);
        assert!(rl.match_ratio(&[1, 1, 3, 1, 1, 0]));
        assert!(!rl.match_ratio(&[1, 1, 1, 1, 1, 0]));
    }

    #[test]
    fn test_exact_with_wildcard() {
        let mut rl = RunLength::new();
        feed(&mut rl, &[(1, 1), (0, 2), (1, 9), (0, 2), (1, 1)]);
        assert!(rl.match_exact(&[1, 2, 0, 2, 1]));
        assert!(!rl.match_exact(&[1, 2, 0, 2, 2]));
    }

    #[test]
    fn test_fresh_ring_never_matches() {
        let rl = RunLength::new();
        assert!(!rl.match_ratio(&[1, 1, 3, 1, 1, 0]));
    }
}
