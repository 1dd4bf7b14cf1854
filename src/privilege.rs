/// Whether the current process observes sockets with root privileges.
///
/// A privileged observer can see the owner of every socket in its namespace,
/// so a `-` owner under root means the socket is not attributable at all.
pub fn is_privileged_observer() -> bool {
    users::get_effective_uid() == 0
}
