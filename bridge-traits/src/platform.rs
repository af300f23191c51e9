//! Threading marker used to keep trait bounds consistent across the crate.
//!
//! Every collaborator in this workspace runs inside the Tokio multi-thread
//! runtime, so bridge traits require `Send + Sync` rather than threading a
//! `cfg` through every definition.

/// Marker trait equivalent to `Send + Sync`, applied to every bridge trait.
pub trait PlatformSendSync: Send + Sync {}
impl<T> PlatformSendSync for T where T: Send + Sync {}

/// Marker trait equivalent to `Send`, used for traits whose implementations
/// only need exclusive (not shared) access, such as stateful decoders.
pub trait PlatformSend: Send {}
impl<T> PlatformSend for T where T: Send {}

/// Dynamic async reader, boxed behind a trait object.
pub type DynAsyncRead = dyn core_async::io::AsyncRead + Send + Unpin;

/// Dynamic async writer, boxed behind a trait object.
pub type DynAsyncWrite = dyn core_async::io::AsyncWrite + Send + Unpin;
