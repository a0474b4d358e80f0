pub struct FileSizeUtils;

impl FileSizeUtils {
    pub fn format_size(size: u64) -> String {
        const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Compact form used in limit messages: whole megabytes print as `10MB`.
    pub fn format_limit(limit: u64) -> String {
        const MIB: u64 = 1024 * 1024;
        if limit >= MIB && limit % MIB == 0 {
            format!("{}MB", limit / MIB)
        } else {
            Self::format_size(limit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_bytes_and_megabytes() {
        assert_eq!(FileSizeUtils::format_size(512), "512 B");
        assert_eq!(FileSizeUtils::format_size(2 * 1024 * 1024), "2.00 MB");
        assert_eq!(FileSizeUtils::format_size(1536), "1.50 KB");
    }

    #[test]
    fn limit_uses_compact_megabytes() {
        assert_eq!(FileSizeUtils::format_limit(10 * 1024 * 1024), "10MB");
        assert_eq!(FileSizeUtils::format_limit(1500), "1.46 KB");
    }
}
