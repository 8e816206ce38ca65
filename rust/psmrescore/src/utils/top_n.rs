use arrayvec::ArrayVec;

/// Keeps the `CAP` largest values pushed into it, in descending order.
///
/// Backed by a fixed-size array, so collecting the top peaks of a
/// spectrum never allocates.
#[derive(Debug, Default)]
pub struct TopNArray<const CAP: usize> {
    vals: ArrayVec<f32, CAP>,
}

impl<const CAP: usize> TopNArray<CAP> {
    pub fn new() -> Self {
        Self {
            vals: ArrayVec::new(),
        }
    }

    pub fn push(&mut self, val: f32) {
        if val.is_nan() {
            return;
        }
        if self.vals.is_full() {
            if val <= *self.vals.last().unwrap() {
                return;
            }
            self.vals.pop();
        }
        let pos = self.vals.partition_point(|&x| x > val);
        self.vals.insert(pos, val);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.vals
    }

    pub fn sum(&self) -> f64 {
        self.vals.iter().map(|&x| x as f64).sum()
    }
}
