//! Extended-criticality predicate gating every write on behalf of others.

use thumbhub_auth::PermissionOracle;
use thumbhub_entity::pixels::Pixels;

/// Whether the session must not create settings or thumbnails for `pixels`.
///
/// True for any session opened through a share. Otherwise true only when
/// the oracle reports the session graph-critical, the current group is not
/// group-writable, and at least one pixel set belongs to another user over
/// whom the session user has no standing (administrator, or leader of the
/// pixel set's group).
pub fn is_extended_critical<'a, I>(oracle: &dyn PermissionOracle, pixels: I) -> bool
where
    I: IntoIterator<Item = &'a Pixels>,
{
    if oracle.current_share_id().is_some() {
        return true;
    }
    if !oracle.is_graph_critical() || oracle.current_group_permissions().is_group_writable() {
        return false;
    }

    let session_user = oracle.effective_user_id();
    let is_admin = oracle.is_administrator();
    pixels.into_iter().any(|p| {
        p.owner_id != session_user && !is_admin && !oracle.is_group_leader(&[p.group_id])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use thumbhub_core::types::{GroupId, ImageId, PixelsId, ShareId, UserId};
    use thumbhub_entity::group::GroupPermissions;

    #[derive(Debug)]
    struct FixedOracle {
        user: UserId,
        critical: bool,
        permissions: GroupPermissions,
        share: Option<ShareId>,
        admin: bool,
        led: Vec<GroupId>,
    }

    impl FixedOracle {
        fn restricted(user: UserId) -> Self {
            Self {
                user,
                critical: true,
                permissions: GroupPermissions::ReadOnly,
                share: None,
                admin: false,
                led: Vec::new(),
            }
        }
    }

    impl PermissionOracle for FixedOracle {
        fn is_graph_critical(&self) -> bool {
            self.critical
        }
        fn current_group_permissions(&self) -> GroupPermissions {
            self.permissions
        }
        fn current_share_id(&self) -> Option<ShareId> {
            self.share
        }
        fn effective_user_id(&self) -> UserId {
            self.user
        }
        fn is_administrator(&self) -> bool {
            self.admin
        }
        fn is_group_leader(&self, group_ids: &[GroupId]) -> bool {
            group_ids.iter().any(|g| self.led.contains(g))
        }
    }

    fn pixels(owner_id: UserId, group_id: GroupId) -> Pixels {
        Pixels {
            id: PixelsId::new(),
            image_id: ImageId::new(),
            owner_id,
            group_id,
            size_x: 600,
            size_y: 400,
            size_z: 1,
            size_c: 1,
            size_t: 1,
        }
    }

    #[test]
    fn test_foreign_pixels_in_read_only_group() {
        let bob = UserId::new();
        let oracle = FixedOracle::restricted(bob);
        let alices = pixels(UserId::new(), GroupId::new());

        assert!(is_extended_critical(&oracle, [&alices]));
    }

    #[test]
    fn test_own_pixels_are_never_critical() {
        let bob = UserId::new();
        let oracle = FixedOracle::restricted(bob);
        let mine = pixels(bob, GroupId::new());

        assert!(!is_extended_critical(&oracle, [&mine]));
        assert!(!is_extended_critical(&oracle, std::iter::empty::<&Pixels>()));
    }

    #[test]
    fn test_standing_lifts_criticality() {
        let bob = UserId::new();
        let group = GroupId::new();
        let alices = pixels(UserId::new(), group);

        let mut leader = FixedOracle::restricted(bob);
        leader.led.push(group);
        assert!(!is_extended_critical(&leader, [&alices]));

        let mut admin = FixedOracle::restricted(bob);
        admin.admin = true;
        assert!(!is_extended_critical(&admin, [&alices]));
    }

    #[test]
    fn test_writable_group_or_non_critical_session() {
        let bob = UserId::new();
        let alices = pixels(UserId::new(), GroupId::new());

        let mut writable = FixedOracle::restricted(bob);
        writable.permissions = GroupPermissions::ReadWrite;
        assert!(!is_extended_critical(&writable, [&alices]));

        let mut relaxed = FixedOracle::restricted(bob);
        relaxed.critical = false;
        assert!(!is_extended_critical(&relaxed, [&alices]));
    }

    #[test]
    fn test_share_is_always_critical() {
        let bob = UserId::new();
        let mut oracle = FixedOracle::restricted(bob);
        oracle.critical = false;
        oracle.share = Some(ShareId::new());

        assert!(is_extended_critical(&oracle, std::iter::empty::<&Pixels>()));
    }

    #[test]
    fn test_any_foreign_pixel_set_suffices() {
        let bob = UserId::new();
        let oracle = FixedOracle::restricted(bob);
        let mine = pixels(bob, GroupId::new());
        let alices = pixels(UserId::new(), GroupId::new());

        assert!(is_extended_critical(&oracle, [&mine, &alices]));
    }
}
