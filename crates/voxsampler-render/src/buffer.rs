//! GPU buffer management.

/// Creates an uninitialized uniform buffer addressed through dynamic offsets.
pub fn create_dynamic_uniform_buffer(
    device: &wgpu::Device,
    size: u64,
    label: Option<&str>,
) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label,
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Rounds `size` up to a multiple of `alignment`.
pub fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Packs `items` into one byte vector, placing item `n` at `n * stride`.
pub fn pack_strided<T: bytemuck::Pod>(items: &[T], stride: usize) -> Vec<u8> {
    let item_size = std::mem::size_of::<T>();
    debug_assert!(stride >= item_size);
    let mut bytes = vec![0u8; items.len() * stride];
    for (chunk, item) in bytes.chunks_exact_mut(stride).zip(items) {
        chunk[..item_size].copy_from_slice(bytemuck::bytes_of(item));
    }
    bytes
}

/// Updates a buffer with new data.
pub fn update_buffer(queue: &wgpu::Queue, buffer: &wgpu::Buffer, data: &[u8]) {
    queue.write_buffer(buffer, 0, data);
}
