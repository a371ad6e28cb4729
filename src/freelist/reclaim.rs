//! Reclamation Stack Implementation
//!
//! A lock-free stack of recyclable nodes based on Treiber's algorithm, extended
//! with a per-node reference count that guards against use-after-recycle.
//!
//! The protocol has one central rule: **a reference count observed at zero may
//! never be raised**. A node whose count has dropped to zero is a *ghost*: it is
//! in flight between its final release and its republication on the stack, and
//! observers back off until the push completes and the count reads 1 again.

use core::fmt;
use core::ptr::{self, NonNull};
use core::sync::atomic::{fence, AtomicPtr, AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

/// An intrusive link participating in the reclamation protocol.
///
/// Embed a `Node` as the **first field** of a `#[repr(C)]` struct to make that
/// struct poolable: a pointer to the outer struct is then a valid pointer to its
/// `Node`, which is how the queues hand their blocks to a [`FreeList`].
///
/// The two fields serve disjoint phases of a node's life:
/// - `next` links the node into the free stack and is meaningful only while the
///   node is on the stack (or mid-push);
/// - `refcnt` counts logical references while the node is live outside the
///   stack. A node resting on the stack always carries a count of 1 (the slot
///   reference); 0 is the transient ghost state.
#[repr(C)]
#[derive(Debug)]
pub struct Node {
    next: AtomicPtr<Node>,
    refcnt: AtomicUsize,
}

impl Node {
    /// Creates a detached node carrying its own slot reference.
    pub const fn new() -> Self {
        Self {
            next: AtomicPtr::new(ptr::null_mut()),
            refcnt: AtomicUsize::new(1),
        }
    }

    /// Attempts to take an additional reference on this node.
    ///
    /// Fails (returning `false`) when the node is a ghost or when the count
    /// moved under us; callers retry their whole read loop in either case. The
    /// compare-exchange is what enforces the no-raise-from-zero rule: we only
    /// ever install `t + 1` over the non-zero `t` we actually observed.
    #[inline]
    pub fn try_acquire(&self) -> bool {
        let t = self.refcnt.load(Ordering::Relaxed);
        t != 0
            && self
                .refcnt
                .compare_exchange_weak(t, t + 1, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

/// A lock-free stack of recyclable nodes.
///
/// The list does not own the nodes threaded through it. Users allocate nodes,
/// lend them to the pool, and remain responsible for freeing them once the pool
/// is drained. Both queues in this crate follow that split: the queue owns every
/// block it ever allocated and drains the pool on drop.
///
/// # Examples
///
/// ```rust
/// use relayq::freelist::{FreeList, Node};
///
/// let pool = FreeList::new();
/// let node = Box::into_raw(Box::new(Node::new()));
///
/// unsafe { pool.push(std::ptr::NonNull::new(node).unwrap()) };
/// let claimed = pool.pop().unwrap();
/// assert_eq!(claimed.as_ptr(), node);
///
/// // The pool never frees nodes; the caller does.
/// unsafe { drop(Box::from_raw(claimed.as_ptr())) };
/// ```
pub struct FreeList {
    top: CachePadded<AtomicPtr<Node>>,
}

impl FreeList {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self {
            top: CachePadded::new(AtomicPtr::new(ptr::null_mut())),
        }
    }

    /// Drops one reference to `node`, republishing it onto the stack when the
    /// last reference dies.
    ///
    /// The republication loop repairs `node.next` to the currently observed top
    /// before every CAS attempt; a stale link here would silently truncate the
    /// stack. ABA on `top` is harmless: this node provably just passed through
    /// zero, so no other thread can be racing to publish the *same* node, and
    /// the CAS only ever splices in front of the top value it compared against.
    ///
    /// The count is reset to 1 only after the winning CAS; between publication
    /// and the reset, poppers see a ghost and retry.
    ///
    /// # Safety
    ///
    /// `node` must be valid, the caller must hold one of its counted
    /// references, and the allocation must outlive the pool's use of it.
    pub unsafe fn release_ref(&self, node: NonNull<Node>) {
        let n = unsafe { node.as_ref() };
        if n.refcnt.fetch_sub(1, Ordering::Release) != 1 {
            return;
        }
        // Synchronize with every earlier holder before touching the link.
        fence(Ordering::Acquire);
        loop {
            let t = self.top.load(Ordering::Relaxed);
            n.next.store(t, Ordering::Relaxed);
            if self
                .top
                .compare_exchange_weak(t, node.as_ptr(), Ordering::Release, Ordering::Relaxed)
                .is_ok()
            {
                n.refcnt.store(1, Ordering::Relaxed);
                break;
            }
        }
    }

    /// Returns a node to the pool.
    ///
    /// Alias of [`release_ref`](Self::release_ref), named for the call sites
    /// that hand back a node they own outright rather than dropping a transient
    /// reference.
    ///
    /// # Safety
    ///
    /// Same contract as [`release_ref`](Self::release_ref).
    #[inline]
    pub unsafe fn push(&self, node: NonNull<Node>) {
        unsafe { self.release_ref(node) }
    }

    /// Tries to claim the top node, transferring its slot reference to the
    /// caller.
    ///
    /// Returns `None` only when the stack was observed empty. A claimed node
    /// comes back quiescent with a count of 1 and a `next` link that must be
    /// treated as garbage.
    pub fn pop(&self) -> Option<NonNull<Node>> {
        loop {
            let u = NonNull::new(self.top.load(Ordering::Acquire))?;
            let n = unsafe { u.as_ref() };
            // A failed acquire means the node is a ghost or the count moved;
            // either way, start over from the (possibly new) top.
            if !n.try_acquire() {
                continue;
            }
            // Holding a reference pins the node above zero, so nobody can
            // republish it, and nobody but a publisher ever writes `next`:
            // the link we read is a stable snapshot.
            let nv = n.next.load(Ordering::Relaxed);
            let claimed = self
                .top
                .compare_exchange_weak(u.as_ptr(), nv, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok();
            // Drop the transient reference taken above. For the winner this
            // settles the claimed node at a count of 1, now meaning "claimed,
            // quiescent", and ownership has moved to the caller. A loser that
            // turns out to hold the last reference performs the delayed push.
            unsafe { self.release_ref(u) };
            if claimed {
                return Some(u);
            }
        }
    }

    /// Whether the stack was empty at the moment of observation.
    pub fn is_empty(&self) -> bool {
        self.top.load(Ordering::Acquire).is_null()
    }
}

impl Default for FreeList {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FreeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FreeList")
            .field("top", &self.top.load(Ordering::Relaxed))
            .finish()
    }
}

// The pool hands nodes between threads; the nodes themselves are only touched
// through atomics while shared.
unsafe impl Send for FreeList {}
unsafe impl Sync for FreeList {}
