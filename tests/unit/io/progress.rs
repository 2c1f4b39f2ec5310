//! Tests for batch progress tracking

#[cfg(test)]
mod tests {
    use spatialenrich::io::configuration::MAX_INDIVIDUAL_PROGRESS_BARS;
    use spatialenrich::io::progress::ProgressManager;

    // Tests a hidden manager runs a full batch lifecycle
    // Verified by setting wrong initial state
    #[test]
    fn test_progress_lifecycle() {
        let mut pm = ProgressManager::new(true);
        pm.initialize(3);
        pm.complete_fov("a", true);
        pm.complete_fov("b", false);
        pm.complete_fov("c", true);
        assert_eq!(pm.failed_count(), 1);
        pm.finish();
    }

    // Tests empty batches and finishing before initialization
    // Verified by unwrapping the batch bar
    #[test]
    fn test_progress_empty() {
        let pm = ProgressManager::new(true);
        pm.complete_fov("early", false);
        pm.finish();

        let mut pm = ProgressManager::new(true);
        pm.initialize(0);
        pm.finish();
        assert_eq!(pm.failed_count(), 0);
    }

    // Tests large batches keep a bounded window of recent FOVs
    // Verified by removing the window bound
    #[test]
    fn test_progress_many_fovs() {
        let mut pm = ProgressManager::new(true);
        let count = MAX_INDIVIDUAL_PROGRESS_BARS * 4;
        pm.initialize(count);
        for i in 0..count {
            pm.complete_fov(&format!("fov{i}"), i % 3 != 0);
        }
        assert_eq!(pm.failed_count(), count.div_ceil(3));
        pm.finish();
    }

    // Tests completions can be reported from worker threads
    // Verified by requiring exclusive access to complete
    #[test]
    fn test_progress_concurrent() {
        let mut pm = ProgressManager::new(true);
        pm.initialize(8);
        std::thread::scope(|scope| {
            for i in 0..8 {
                let pm = &pm;
                scope.spawn(move || pm.complete_fov(&format!("fov{i}"), i % 2 == 0));
            }
        });
        assert_eq!(pm.failed_count(), 4);
        pm.finish();
    }
}
