use recipes_client::RecipesClient;
use recipes_proto::v1::{Recipe, RecipeFields};

use crate::frontend::TerminalFrontend;
use crate::page::{Page, PageError};
use crate::{RecipeOpt, RecipesClientParser};

impl RecipeOpt {
    pub async fn exec(
        &self,
        opt: &RecipesClientParser,
        client: &RecipesClient,
    ) -> Result<(), PageError> {
        let frontend = TerminalFrontend::new(opt.output_mode);
        let page: Page<Recipe, _> = Page::new(client, opt.session_store(), frontend)
            .await
            .inspect_err(|e| eprintln!("{}", e))?;

        let result = match self {
            RecipeOpt::List => page.load().await.map(|_| ()),
            RecipeOpt::Search { term } => page.search(term).await.map(|_| ()),
            RecipeOpt::Add { name, instructions } => {
                let mut form = RecipeFields::new(name, instructions);
                page.add(&mut form).await
            }
            RecipeOpt::Update { name, instructions } => {
                let mut form = RecipeFields::new(name, instructions);
                page.update(&mut form).await
            }
            RecipeOpt::Delete { name } => {
                let mut name = name.clone();
                page.delete(&mut name).await
            }
        };

        page.frontend().flush();
        result
    }
}
