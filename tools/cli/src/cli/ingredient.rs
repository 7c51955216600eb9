use recipes_client::RecipesClient;
use recipes_proto::v1::{Ingredient, IngredientFields};

use crate::frontend::TerminalFrontend;
use crate::page::{Page, PageError};
use crate::{IngredientOpt, RecipesClientParser};

impl IngredientOpt {
    pub async fn exec(
        &self,
        opt: &RecipesClientParser,
        client: &RecipesClient,
    ) -> Result<(), PageError> {
        let frontend = TerminalFrontend::new(opt.output_mode);
        let page: Page<Ingredient, _> = Page::new(client, opt.session_store(), frontend)
            .await
            .inspect_err(|e| eprintln!("{}", e))?;

        let result = match self {
            IngredientOpt::List => page.load().await.map(|_| ()),
            IngredientOpt::Add { name } => {
                let mut form = IngredientFields::new(name);
                page.add(&mut form).await
            }
            IngredientOpt::Delete { name } => {
                let mut name = name.clone();
                page.delete(&mut name).await
            }
        };

        page.frontend().flush();
        result
    }
}
