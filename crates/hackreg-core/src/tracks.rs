use crate::types::Track;

/// Track catalogue shown on the tracks page.
///
/// Selection happens upstream of the wizard; the wizard only receives the
/// chosen entry and fails closed when none was picked.
#[derive(Debug, Clone)]
pub struct TrackCatalog {
    tracks: Vec<Track>,
}

impl TrackCatalog {
    /// The event's standard three tracks.
    pub fn standard() -> Self {
        Self {
            tracks: vec![
                Track::new(
                    "ai-ml",
                    "AI & Machine Learning",
                    "Build the next generation of intelligent applications",
                )
                .with_profile(
                    "Dive into the world of artificial intelligence and machine learning. \
                     Create innovative solutions using cutting-edge technologies like deep \
                     learning, natural language processing, computer vision, and more.",
                    vec![
                        "Build an AI-powered personal assistant".to_string(),
                        "Create a computer vision application for social good".to_string(),
                        "Develop a predictive analytics solution for healthcare".to_string(),
                        "Design an AI-driven recommendation system".to_string(),
                    ],
                    vec![
                        "TensorFlow".to_string(),
                        "PyTorch".to_string(),
                        "Scikit-learn".to_string(),
                        "OpenAI API".to_string(),
                        "Hugging Face".to_string(),
                    ],
                ),
                Track::new(
                    "web3",
                    "Web3 & Blockchain",
                    "Create decentralized solutions for the future",
                )
                .with_profile(
                    "Explore the potential of blockchain technology and decentralized \
                     applications. Build solutions that leverage smart contracts, DeFi, \
                     NFTs, and other Web3 technologies.",
                    vec![
                        "Create a DeFi application".to_string(),
                        "Build a decentralized marketplace".to_string(),
                        "Develop a blockchain-based voting system".to_string(),
                        "Design an NFT platform for creators".to_string(),
                    ],
                    vec![
                        "Ethereum".to_string(),
                        "Solidity".to_string(),
                        "Web3.js".to_string(),
                        "IPFS".to_string(),
                        "Hardhat".to_string(),
                    ],
                ),
                Track::new(
                    "open",
                    "Open Innovation",
                    "Solve real-world problems with creative solutions",
                )
                .with_profile(
                    "Let your creativity run wild! This track is for innovative solutions \
                     that don't fit into traditional categories. Whether it's a unique web \
                     application, mobile solution, or novel use of emerging technologies.",
                    vec![
                        "Build a solution for environmental sustainability".to_string(),
                        "Create an innovative EdTech platform".to_string(),
                        "Develop a social impact project".to_string(),
                        "Design a smart city application".to_string(),
                    ],
                    vec![
                        "Any modern tech stack".to_string(),
                        "Cloud Services".to_string(),
                        "IoT".to_string(),
                        "Mobile Technologies".to_string(),
                    ],
                ),
            ],
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn find(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|track| track.id == id)
    }
}
