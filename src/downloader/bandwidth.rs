use std::time::{Duration, Instant};

const SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// 下载速度估算，每隔一秒以上采样一次并做平滑
#[derive(Debug, Clone)]
pub struct BandwidthCalc {
    nbytes: u64,
    prev_time: Instant,
    prev_bw: f64,
    prev_len: usize,
}

impl Default for BandwidthCalc {
    fn default() -> Self {
        Self::starting_at(Instant::now())
    }
}

impl BandwidthCalc {
    pub fn starting_at(now: Instant) -> Self {
        Self {
            nbytes: 0,
            prev_time: now,
            prev_bw: 0.0,
            prev_len: 0,
        }
    }

    pub fn received(&mut self, len: usize) {
        self.received_at(len, Instant::now());
    }

    pub fn received_at(&mut self, len: usize, now: Instant) {
        self.nbytes += len as u64;
        let elapsed = now.saturating_duration_since(self.prev_time);

        if elapsed > SAMPLE_WINDOW {
            let bw = self.nbytes as f64 / elapsed.as_secs_f64();
            self.prev_bw = (self.prev_bw + 2.0 * bw) / 3.0;
            self.nbytes = 0;
            self.prev_time = now;
        }
    }

    pub fn rate(&self) -> f64 {
        self.prev_bw
    }

    /// 渲染速度文本，比上一次短时用空格补齐以覆盖旧内容
    pub fn render(&mut self) -> String {
        let bw = self.prev_bw;
        let text = if bw == 0.0 {
            String::new()
        } else if bw < 1e3 {
            format!(" ({}B/s)", bw as u64)
        } else if bw < 1e6 {
            format!(" ({:.2}KB/s)", bw / 1e3)
        } else if bw < 1e9 {
            format!(" ({:.2}MB/s)", bw / 1e6)
        } else {
            format!(" ({:.2}GB/s)", bw / 1e9)
        };

        let pad = self.prev_len.saturating_sub(text.len());
        self.prev_len = text.len();
        format!("{}{}", text, " ".repeat(pad))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_before_first_sample() {
        let start = Instant::now();
        let mut bw = BandwidthCalc::starting_at(start);
        bw.received_at(4096, start + Duration::from_millis(300));
        assert_eq!(bw.render(), "");
    }

    #[test]
    fn samples_after_one_second() {
        let start = Instant::now();
        let mut bw = BandwidthCalc::starting_at(start);
        bw.received_at(1_000_000, start + Duration::from_millis(500));
        bw.received_at(1_000_000, start + Duration::from_secs(2));

        // 2MB / 2s = 1MB/s，平滑后为 2/3
        assert!((bw.rate() - 666_666.666).abs() < 1.0);
        assert_eq!(bw.render(), " (666.67KB/s)");
    }

    #[test]
    fn smooths_successive_samples() {
        let start = Instant::now();
        let mut bw = BandwidthCalc::starting_at(start);
        bw.received_at(3000, start + Duration::from_millis(1500));
        bw.received_at(3000, start + Duration::from_millis(3000));
        // 第一次 2000B/s -> 1333.33，第二次 (1333.33 + 4000) / 3
        assert!((bw.rate() - 1777.777).abs() < 0.01);
    }

    #[test]
    fn pads_shorter_rendering() {
        let start = Instant::now();
        let mut bw = BandwidthCalc::starting_at(start);
        // 1MB / 2s = 500KB/s，平滑后为 333.33KB/s
        bw.received_at(1_000_000, start + Duration::from_secs(2));
        assert_eq!(bw.render(), " (333.33KB/s)");

        // 之后没有数据：111.11KB/s，再到 37.04KB/s，比上次短一个字符
        bw.received_at(0, start + Duration::from_secs(4));
        bw.received_at(0, start + Duration::from_secs(6));
        assert_eq!(bw.render(), " (37.04KB/s) ");
    }
}
