//! Page-ownership query boundary.
//!
//! The page directory (which node owns a guest page, how hot it is) is a
//! separate component. The coordinator only fixes the query shape and the
//! address parsing rules in front of it.

use ssi_common::{GuestPhysAddr, PageInfo};

/// Lookup surface of the page directory
pub trait PageDirectory: Send + Sync {
    fn lookup(&self, gpa: GuestPhysAddr) -> PageInfo;
}

/// Directory used until a real one is attached: every page is unowned and
/// cold.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnassignedPageDirectory;

impl PageDirectory for UnassignedPageDirectory {
    fn lookup(&self, gpa: GuestPhysAddr) -> PageInfo {
        PageInfo::unassigned(gpa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unassigned_directory_reports_cold_page() {
        let directory: &dyn PageDirectory = &UnassignedPageDirectory;
        let info = directory.lookup("4096".parse().unwrap());

        assert_eq!(info.gpa.to_string(), "0x1000");
        assert_eq!(info.owner_node, 0);
        assert_eq!(info.heat, 0);
        assert_eq!(info.access_count, 0);
    }
}
