use qc_auth::GrantSurface;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use url::Url;

/// Sign-in surface for a terminal: the user opens the authorize URL in a
/// browser and pastes back the address the browser landed on.
///
/// End of input counts as closing the window.
pub struct TerminalSurface {
    input: Lines<BufReader<Stdin>>,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self {
            input: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for TerminalSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl GrantSurface for TerminalSurface {
    async fn open(&mut self, authorize_url: &Url) -> qc_auth::Result<()> {
        println!("Open this address in your browser and sign in with your Microsoft account:");
        println!();
        println!("  {}", authorize_url);
        println!();
        println!("When the browser shows a blank page, paste its full address here:");
        Ok(())
    }

    async fn next_navigation(&mut self) -> Option<String> {
        loop {
            match self.input.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => return Some(line.trim().to_string()),
                Ok(None) | Err(_) => return None,
            }
        }
    }

    async fn close(&mut self) {}
}
