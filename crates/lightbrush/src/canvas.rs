/// Two buffers alternating between "current" (read) and "next" (write).
///
/// Roles are an index into a fixed pair, so the two can never alias.
#[derive(Debug)]
pub struct SurfacePair<T> {
    surfaces: [T; 2],
    current: usize,
}

impl<T> SurfacePair<T> {
    pub fn new(first: T, second: T) -> Self {
        Self {
            surfaces: [first, second],
            current: 0,
        }
    }

    pub fn from_fn(mut make: impl FnMut(usize) -> T) -> Self {
        Self::new(make(0), make(1))
    }

    pub fn current(&self) -> &T {
        &self.surfaces[self.current]
    }

    pub fn current_mut(&mut self) -> &mut T {
        &mut self.surfaces[self.current]
    }

    pub fn next(&self) -> &T {
        &self.surfaces[1 - self.current]
    }

    /// Index of the buffer currently holding state, for logging.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Borrows the current buffer for reading and the next one for writing.
    pub fn split(&mut self) -> (&T, &mut T) {
        let [first, second] = &mut self.surfaces;
        if self.current == 0 {
            (first, second)
        } else {
            (second, first)
        }
    }

    pub fn swap(&mut self) {
        self.current = 1 - self.current;
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.surfaces.iter()
    }
}
