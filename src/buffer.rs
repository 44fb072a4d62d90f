use crate::error::{Error, Result};
use std::ops::{Deref, DerefMut};

/// Fixed-size buffer allocated once per render session. Allocation is fallible so an
/// exhausted allocator is reported with the buffer's name instead of aborting.
pub struct DeviceBuffer<T> {
    name: &'static str,
    data: Vec<T>,
}
impl<T: Clone> DeviceBuffer<T> {
    pub fn new(name: &'static str, size: usize, fill: T) -> Result<DeviceBuffer<T>> {
        let mut data = Vec::new();
        data.try_reserve_exact(size).map_err(|_| Error::Allocation {
            buffer: name,
            count: size,
        })?;
        data.resize(size, fill);
        tracing::debug!(buffer = name, size, "allocated buffer");
        Ok(DeviceBuffer { name, data })
    }

    pub fn copy_from(&mut self, data: &[T]) {
        if self.data.len() != data.len() {
            panic!(
                "{} buffer holds {} elements, source has {}",
                self.name,
                self.data.len(),
                data.len()
            );
        }
        self.data.clone_from_slice(data);
    }

    pub fn copy_to(&self, data: &mut [T]) {
        if self.data.len() != data.len() {
            panic!(
                "{} buffer holds {} elements, destination has {}",
                self.name,
                self.data.len(),
                data.len()
            );
        }
        data.clone_from_slice(&self.data);
    }

    pub fn fill(&mut self, value: T) {
        for v in self.data.iter_mut() {
            *v = value.clone();
        }
    }
}
impl<T> Deref for DeviceBuffer<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.data
    }
}
impl<T> DerefMut for DeviceBuffer<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}
